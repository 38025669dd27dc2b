use std::fmt;

use serde::{Deserialize, Serialize};

use super::patient::{capitalize, PatientName};

/// Canonical symptom token: lower-case words joined by `_` (`sore_throat`).
///
/// Identity is exact string equality; normalization happens before a
/// `Symptom` is built (see `diagnosis::normalize`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symptom(String);

impl Symptom {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable label: `sore_throat` → `Sore throat`.
    pub fn label(&self) -> String {
        capitalize(&self.0.replace('_', " "))
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthetic fact identifier `<PATIENT>_SYM<seq>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SymptomId {
    pub prefix: String,
    pub seq: u64,
}

impl SymptomId {
    pub fn new(patient: &PatientName, seq: u64) -> Self {
        Self {
            prefix: patient.id_prefix(),
            seq,
        }
    }

    /// Parse `ALICE_SYM12`. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let (prefix, seq) = s.rsplit_once("_SYM")?;
        if prefix.is_empty() {
            return None;
        }
        let seq = seq.parse().ok()?;
        Some(Self {
            prefix: prefix.to_string(),
            seq,
        })
    }
}

impl fmt::Display for SymptomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_SYM{}", self.prefix, self.seq)
    }
}

/// One `has_symptom` assertion in the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomFact {
    pub id: SymptomId,
    pub patient: PatientName,
    pub symptom: Symptom,
}
