use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// Canonical skill vocabulary.
///
/// Entries keep their load order, which decides ties during normalization.
/// Two entries may not differ only by case.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: Vec<String>,
    lowered: Vec<String>,
    by_lower: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();

        for entry in entries {
            let entry: String = entry.into();
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(EngineError::VocabularyUnavailable(
                    "blank skill name in vocabulary".to_string(),
                ));
            }

            let lower = entry.to_lowercase();
            if let Some(&existing) = vocabulary.by_lower.get(&lower) {
                return Err(EngineError::VocabularyUnavailable(format!(
                    "'{}' duplicates '{}' (names must be unique ignoring case)",
                    entry, vocabulary.entries[existing]
                )));
            }

            vocabulary.by_lower.insert(lower.clone(), vocabulary.entries.len());
            vocabulary.entries.push(entry.to_string());
            vocabulary.lowered.push(lower);
        }

        Ok(vocabulary)
    }

    /// Load the vocabulary from a JSON file.
    ///
    /// Accepts either an array of names or an object whose keys are the
    /// canonical names. An empty vocabulary is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading skill vocabulary from {:?}", path);

        let value = super::read_json(path).map_err(EngineError::VocabularyUnavailable)?;
        let vocabulary = Self::from_json(value)?;

        if vocabulary.is_empty() {
            return Err(EngineError::VocabularyUnavailable(format!(
                "{}: vocabulary is empty",
                path.display()
            )));
        }

        info!("Skill vocabulary loaded ({} entries)", vocabulary.len());
        Ok(vocabulary)
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let names: Vec<String> = match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(name),
                    other => Err(EngineError::VocabularyUnavailable(format!(
                        "expected skill name, found {}",
                        other
                    ))),
                })
                .collect::<Result<_>>()?,
            Value::Object(map) => map.into_iter().map(|(name, _)| name).collect(),
            other => {
                return Err(EngineError::VocabularyUnavailable(format!(
                    "expected array or object, found {}",
                    other
                )))
            }
        };

        debug!("Parsed {} vocabulary names", names.len());
        Self::new(names)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical names in load order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Exact, case-sensitive membership
    pub fn contains(&self, name: &str) -> bool {
        self.by_lower
            .get(&name.to_lowercase())
            .is_some_and(|&i| self.entries[i] == name)
    }

    /// Canonical casing of `name` if it matches an entry ignoring case
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.by_lower
            .get(&name.to_lowercase())
            .map(|&i| self.entries[i].as_str())
    }

    /// (canonical, lower-cased) pairs in load order
    pub(crate) fn iter_lowered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .zip(self.lowered.iter())
            .map(|(entry, lower)| (entry.as_str(), lower.as_str()))
    }
}
