use std::env;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use repoqa_core::config::{Config, Settings};
use repoqa_core::{Error, TaskConfig};
use repoqa_pipeline::{CancellationToken, DenseOrigin, Engine, PipelineOutput};

const USAGE: &str = "Usage: repoqa <ask \"<question>\" | repl | index> [--expand] [--summarize] [--verbose] [--rebuild]";

#[derive(Debug, PartialEq)]
enum Command {
    Ask(String),
    Repl,
    Index,
}

/// Splits argv into a command and the task flags, starting from `base`.
fn parse_args(args: &[String], base: TaskConfig) -> Result<(Command, TaskConfig), String> {
    let mut task = base;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--expand" | "--expand_query" => task.expand_query = true,
            "--summarize" => task.summarize = true,
            "--verbose" | "-v" => task.verbose = true,
            "--rebuild" | "--rebuild_index" => task.rebuild_index = true,
            s if s.starts_with('-') => return Err(format!("unknown flag {s}")),
            s => positional.push(s.to_string()),
        }
    }
    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("ask") => {
            let question = positional.by_ref().collect::<Vec<_>>().join(" ");
            if question.trim().is_empty() {
                return Err("ask needs a question".to_string());
            }
            Command::Ask(question)
        }
        Some("repl") => Command::Repl,
        Some("index") => Command::Index,
        Some(other) => return Err(format!("unknown command {other}")),
        None => return Err("missing command".to_string()),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument {extra}"));
    }
    Ok((command, task))
}

fn print_output(out: &PipelineOutput, task: &TaskConfig) {
    if task.verbose {
        println!("Question: {}", out.question);
    }
    println!("Retrieved {} files:", out.retrieved.len());
    for (i, id) in out.retrieved.iter().enumerate() {
        println!("  {}. {}", i + 1, id);
    }
    if let Some(answer) = &out.answer {
        println!("\n{answer}");
    }
}

/// Cancels the returned token on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

async fn open_engine(settings: &Settings, task: &TaskConfig) -> anyhow::Result<Engine> {
    let engine = Engine::open(settings, task.rebuild_index).await?;
    let origin = match engine.dense_origin() {
        DenseOrigin::Loaded => "loaded",
        DenseOrigin::Built => "built",
    };
    eprintln!("Indexed {} documents ({} chunks), dense index {}", engine.documents(), engine.chunks(), origin);
    Ok(engine)
}

async fn repl(engine: &Engine, task: TaskConfig) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Q: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        let cancel = cancel_on_ctrl_c();
        match engine.pipeline().run_until_cancelled(question, task, &cancel).await {
            Ok(out) => print_output(&out, &task),
            Err(Error::Cancelled) => eprintln!("cancelled"),
            Err(e) => eprintln!("error: {e}"),
        }
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let (command, task) = match parse_args(&args, settings.task) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let engine = open_engine(&settings, &task).await?;
    match command {
        Command::Ask(question) => {
            let cancel = cancel_on_ctrl_c();
            let out = engine.pipeline().run_until_cancelled(&question, task, &cancel).await?;
            print_output(&out, &task);
        }
        Command::Repl => repl(&engine, task).await?,
        Command::Index => println!("✅ Index ready at {}", settings.index.dir),
    }
    Ok(())
}
