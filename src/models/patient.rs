use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static SINGLE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatientNameError {
    #[error("Patient name must be a single first name (letters only)")]
    NotSingleName,
}

/// Normalized patient identifier: one ASCII word, first letter upper-case,
/// the rest lower-case (`"  aLiCe "` → `"Alice"`).
///
/// The same string is used as the patient symbol in the knowledge base, so
/// it must never contain whitespace or parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PatientName(String);

impl PatientName {
    pub fn parse(raw: &str) -> Result<Self, PatientNameError> {
        let name = capitalize(raw.trim());
        if !SINGLE_NAME.is_match(&name) {
            return Err(PatientNameError::NotSingleName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix used for symptom fact identifiers (`ALICE_SYM3`).
    pub fn id_prefix(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for PatientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First character upper-cased, remaining characters lower-cased.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
