use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sample::{DEFAULT_BUCKET_SIZE, DEFAULT_MAX_TOTAL};
use crate::serialize::DEFAULT_TRUNCATE_AT;

/// Kind names (as produced by `classify`) whose prototypes are not walked.
pub type IgnoredTypes = IndexSet<String>;

pub static DEFAULT_IGNORED_TYPES: Lazy<IgnoredTypes> = Lazy::new(IgnoredTypes::new);
pub static DEFAULT_OPTIONS: Lazy<DescribeOptions> = Lazy::new(DescribeOptions::default);

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DescribeOptions {
    pub ignored_types: IgnoredTypes,
    pub bucket_size: usize,
    pub max_total: usize,
    pub truncate_at: usize,
    /// Refuse graphs nested deeper than this. `None` walks without limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            ignored_types: DEFAULT_IGNORED_TYPES.clone(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            max_total: DEFAULT_MAX_TOTAL,
            truncate_at: DEFAULT_TRUNCATE_AT,
            max_depth: None,
        }
    }
}

impl DescribeOptions {
    pub fn ignoring<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_types.extend(kinds.into_iter().map(Into::into));
        self
    }
    pub fn is_ignored(&self, kind: &str) -> bool {
        self.ignored_types.contains(kind)
    }
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        from_str_with_path(src)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&src).map_err(|error| error.in_file(path))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("{}at JSON path {path} → {message}", location(.file))]
    Invalid { file: Option<PathBuf>, path: String, message: String },
}

fn location(file: &Option<PathBuf>) -> String {
    file.as_ref().map(|f| format!("{}: ", f.display())).unwrap_or_default()
}

impl ConfigError {
    fn in_file(self, file: &Path) -> Self {
        match self {
            Self::Invalid { path, message, .. } => {
                Self::Invalid { file: Some(file.to_path_buf()), path, message }
            }
            other => other,
        }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, ConfigError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| ConfigError::Invalid {
        file: None,
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let options = DescribeOptions::default();
        assert_eq!(options.bucket_size, 10);
        assert_eq!(options.max_total, 50);
        assert_eq!(options.truncate_at, 100);
        assert!(options.ignored_types.is_empty());
        assert_eq!(options.max_depth, None);
        assert_eq!(*DEFAULT_OPTIONS, options);
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let options =
            DescribeOptions::from_json_str(r#"{"ignoredTypes": ["Object"], "maxDepth": 8}"#).unwrap();
        assert!(options.is_ignored("Object"));
        assert!(!options.is_ignored("Array"));
        assert_eq!(options.max_depth, Some(8));
        assert_eq!(options.bucket_size, 10);
    }

    #[test]
    fn errors_name_the_offending_field() {
        let err = DescribeOptions::from_json_str(r#"{"bucketSize": "ten"}"#).unwrap_err();
        let ConfigError::Invalid { path, .. } = &err else { panic!("unexpected {err:?}") };
        assert_eq!(path, "bucketSize");

        let err = DescribeOptions::from_json_str(r#"{"ignoredTypes": ["a", 3]}"#).unwrap_err();
        assert!(err.to_string().starts_with("at JSON path ignoredTypes[1]"), "{err}");

        assert!(DescribeOptions::from_json_str(r#"{"bucketsize": 3}"#).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DescribeOptions::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn builder_extends_ignored_types() {
        let options = DescribeOptions::default().ignoring(["Base", "Object"]);
        assert_eq!(options.ignored_types.iter().collect::<Vec<_>>(), ["Base", "Object"]);
    }
}
