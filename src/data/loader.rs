// ============================================================
// Layer 4 — Example Loader
// ============================================================
// Reads a JSON array of already-tokenized examples:
//
//   [
//     { "id": "q1",
//       "document": [12, 7, 99, 4],
//       "features": [[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
//       "question": [7, 31] },
//     ...
//   ]
//
// `features` may be omitted. Token ids must already come from
// the same vocabulary the reader was configured with.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::example::ReaderExample;
use crate::domain::traits::ExampleSource;

pub struct JsonExampleLoader {
    path: PathBuf,
}

impl JsonExampleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for JsonExampleLoader {
    fn load_all(&self) -> Result<Vec<ReaderExample>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read examples from '{}'", self.path.display()))?;

        let examples: Vec<ReaderExample> = serde_json::from_str(&raw)
            .with_context(|| format!("'{}' is not a JSON array of examples", self.path.display()))?;

        for example in &examples {
            if !example.features.is_empty() && example.features.len() != example.document.len() {
                tracing::warn!(
                    "{}: {} feature rows for {} document tokens, missing rows become zeros",
                    example.id,
                    example.features.len(),
                    example.document.len()
                );
            }
        }

        tracing::info!("Loaded {} examples from {}", examples.len(), self.path.display());
        Ok(examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fusionnet-loader-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_loads_json_array() {
        let path = temp_file(
            "ok.json",
            r#"[
                {"id": "a", "document": [1, 2, 3], "question": [4]},
                {"id": "b", "document": [5], "features": [[1.0]], "question": [6, 7]}
            ]"#,
        );

        let examples = JsonExampleLoader::new(path.clone()).load_all().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].document, vec![1, 2, 3]);
        assert_eq!(examples[1].features, vec![vec![1.0]]);
    }

    #[test]
    fn test_reports_bad_json_with_path() {
        let path = temp_file("bad.json", r#"{"id": "not an array"}"#);
        let err  = JsonExampleLoader::new(path.clone()).load_all().unwrap_err();
        fs::remove_file(&path).ok();

        assert!(format!("{err:#}").contains("bad.json"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = JsonExampleLoader::new("/definitely/not/here.json");
        assert!(loader.load_all().is_err());
    }
}
