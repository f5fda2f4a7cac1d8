use repoqa_core::config::LlmSettings;
use repoqa_core::traits::{AnswerSynthesizer, QueryRewriter};
use repoqa_llm::{from_settings, ChatClient, LlmError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves exactly one HTTP response and hands back the raw request.
async fn one_shot_server(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });
    (format!("http://{addr}/v1"), handle)
}

fn settings(endpoint: String) -> LlmSettings {
    LlmSettings { endpoint, model: "test-model".to_string(), api_key: "secret".to_string(), timeout_secs: 5 }
}

#[tokio::test]
async fn expander_returns_trimmed_completion() {
    let (endpoint, server) = one_shot_server("200 OK", r#"{"choices":[{"message":{"content":"  parse_args argparse CLI flags \n"}}]}"#).await;
    let (expander, _) = from_settings(&settings(endpoint)).unwrap();

    let expanded = expander.rewrite("how are flags parsed?").await.unwrap();
    assert_eq!(expanded, "parse_args argparse CLI flags");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_lowercase().contains("authorization: bearer secret"));
    assert!(request.contains("\"model\":\"test-model\""));
    assert!(request.contains("how are flags parsed?"));
}

#[tokio::test]
async fn summarizer_sends_context_before_question() {
    let (endpoint, server) = one_shot_server("200 OK", r#"{"choices":[{"message":{"content":"f does nothing."}}]}"#).await;
    let (_, summarizer) = from_settings(&settings(endpoint)).unwrap();

    let answer = summarizer.synthesize("what does f do?", "Contents of a.py:\ndef f(): pass\n\n").await.unwrap();
    assert_eq!(answer, "f does nothing.");

    let request = server.await.unwrap();
    let context_at = request.find("Contents of a.py").unwrap();
    let question_at = request.find("what does f do?").unwrap();
    assert!(context_at < question_at);
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let (endpoint, _server) = one_shot_server("401 Unauthorized", r#"{"error":{"message":"bad key"}}"#).await;
    let client = ChatClient::new(&settings(endpoint)).unwrap();
    match client.complete("s", None, "u").await {
        Err(LlmError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "bad key");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ChatClient::new(&settings(format!("http://{addr}"))).unwrap();
    assert!(matches!(client.complete("s", None, "u").await, Err(LlmError::Network(_))));
}
