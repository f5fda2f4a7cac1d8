use repoqa_core::error::Result;
use repoqa_core::traits::ContentProvider;
use repoqa_core::types::SourceId;

/// Concatenates the full content of every retrieved file, in rank order.
pub fn make_context(provider: &dyn ContentProvider, source_ids: &[SourceId]) -> Result<String> {
    let mut context = String::new();
    for id in source_ids {
        let content = provider.get_content(id)?;
        context.push_str(&format!("Contents of {id}:\n{content}\n\n"));
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoqa_core::Error;
    use std::collections::HashMap;

    struct Files(HashMap<&'static str, &'static str>);

    impl ContentProvider for Files {
        fn get_content(&self, source_id: &str) -> Result<String> {
            self.0.get(source_id).map(|c| c.to_string()).ok_or_else(|| Error::NotFound(source_id.to_string()))
        }
    }

    #[test]
    fn formats_in_rank_order() {
        let files = Files(HashMap::from([("a.py", "def f(): pass"), ("c.txt", "hello world")]));
        let context = make_context(&files, &["c.txt".to_string(), "a.py".to_string()]).unwrap();
        assert_eq!(context, "Contents of c.txt:\nhello world\n\nContents of a.py:\ndef f(): pass\n\n");
    }

    #[test]
    fn nothing_retrieved_is_empty_context() {
        let files = Files(HashMap::new());
        assert_eq!(make_context(&files, &[]).unwrap(), "");
    }

    #[test]
    fn missing_file_is_reported() {
        let files = Files(HashMap::new());
        assert!(matches!(make_context(&files, &["gone.rs".to_string()]), Err(Error::NotFound(_))));
    }
}
