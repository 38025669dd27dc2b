use std::collections::BTreeSet;

use serde::Serialize;

use super::patient::{capitalize, PatientName};
use super::symptom::Symptom;

/// Outcome of one diagnosis request for one patient.
///
/// `diseases` is a set: the proof search can reach the same conclusion
/// through several derivations.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResult {
    pub patient: PatientName,
    pub symptoms: Vec<Symptom>,
    pub diseases: BTreeSet<String>,
}

impl DiagnosisResult {
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    pub fn symptom_labels(&self) -> Vec<String> {
        self.symptoms.iter().map(Symptom::label).collect()
    }

    pub fn disease_labels(&self) -> Vec<String> {
        self.diseases
            .iter()
            .map(|d| capitalize(&d.replace('_', " ")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_human_readable() {
        let result = DiagnosisResult {
            patient: PatientName::parse("bob").unwrap(),
            symptoms: vec![Symptom::new("runny_nose"), Symptom::new("cough")],
            diseases: ["common_cold".to_string()].into_iter().collect(),
        };
        assert_eq!(result.symptom_labels(), vec!["Runny nose", "Cough"]);
        assert_eq!(result.disease_labels(), vec!["Common cold"]);
        assert!(!result.is_empty());
    }
}
