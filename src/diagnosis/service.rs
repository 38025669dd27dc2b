//! End-to-end diagnosis: extraction, reconciliation, inference.

use std::sync::{Arc, Mutex};

use crate::extraction::SymptomExtractor;
use crate::kb::{FactStore, KnowledgeBase, RuleSource};
use crate::models::{DiagnosisResult, PatientName, Symptom};

use super::normalize::normalize_symptoms;
use super::parser::parse_diagnosed_diseases;
use super::reconcile::{dedupe_symptoms, reconcile, verify_recorded};
use super::DiagnosisError;

pub const DEFAULT_PROOF_DEPTH: u32 = 3;

/// Sequences one diagnosis request.
///
/// The LLM call happens first, outside any lock. Everything that touches the
/// knowledge base then runs on a blocking worker while holding the KB mutex,
/// so concurrent requests never interleave their read-diff-write steps.
#[derive(Clone)]
pub struct DiagnosisService {
    extractor: SymptomExtractor,
    rules: RuleSource,
    proof_depth: u32,
}

impl DiagnosisService {
    pub fn new(extractor: SymptomExtractor, rules: RuleSource, proof_depth: u32) -> Self {
        Self {
            extractor,
            rules,
            proof_depth,
        }
    }

    pub fn extractor_backend(&self) -> &str {
        self.extractor.backend()
    }

    pub fn rules(&self) -> &RuleSource {
        &self.rules
    }

    pub async fn diagnose(
        &self,
        kb: &Arc<Mutex<KnowledgeBase>>,
        patient: PatientName,
        raw_symptoms: &str,
    ) -> Result<DiagnosisResult, DiagnosisError> {
        let extracted = self.extractor.extract(raw_symptoms).await?;
        let symptoms = dedupe_symptoms(&normalize_symptoms(&extracted));
        if symptoms.is_empty() {
            return Err(DiagnosisError::NoSymptoms);
        }

        let kb = Arc::clone(kb);
        let rules = self.rules.clone();
        let depth = self.proof_depth;
        let task_patient = patient.clone();
        let task_symptoms = symptoms.clone();
        let span = tracing::Span::current();

        let diseases = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let mut guard = kb
                .lock()
                .map_err(|_| DiagnosisError::Worker("knowledge base lock poisoned".into()))?;
            run_knowledge_phase(&mut *guard, &rules, &task_patient, &task_symptoms, depth)
        })
        .await
        .map_err(|e| DiagnosisError::Worker(e.to_string()))??;

        tracing::info!(
            patient = %patient,
            symptoms = symptoms.len(),
            diseases = ?diseases,
            "Diagnosis complete"
        );

        Ok(DiagnosisResult {
            patient,
            symptoms,
            diseases,
        })
    }
}

/// The critical section: reconcile, verify, reload rules, infer, parse.
///
/// Callers must hold exclusive access to `store` for the whole call.
pub fn run_knowledge_phase<S: FactStore + ?Sized>(
    store: &mut S,
    rules: &RuleSource,
    patient: &PatientName,
    symptoms: &[Symptom],
    depth: u32,
) -> Result<std::collections::BTreeSet<String>, DiagnosisError> {
    reconcile(store, patient, symptoms)?;
    verify_recorded(store, patient, symptoms)?;

    store.load_rules(Arc::new(rules.load()?))?;
    let terms = store.infer_diagnoses(patient, depth)?;
    tracing::debug!(patient = %patient, depth, proofs = terms.len(), "Proof search finished");

    Ok(parse_diagnosed_diseases(&terms, patient))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::flatten_symptom_results;
    use crate::extraction::{ExtractionError, MockLlmClient};
    use crate::kb::KbError;

    fn service(reply: &str) -> DiagnosisService {
        DiagnosisService::new(
            SymptomExtractor::new(Arc::new(MockLlmClient::new(reply))),
            RuleSource::Bundled,
            DEFAULT_PROOF_DEPTH,
        )
    }

    fn kb() -> Arc<Mutex<KnowledgeBase>> {
        Arc::new(Mutex::new(KnowledgeBase::default()))
    }

    fn alice() -> PatientName {
        PatientName::parse("alice").unwrap()
    }

    #[tokio::test]
    async fn diagnoses_influenza_from_free_text() {
        let kb = kb();
        let result = service("Fever, Cough, Fatigue")
            .diagnose(&kb, alice(), "hot, coughing, exhausted")
            .await
            .unwrap();

        assert_eq!(result.symptom_labels(), vec!["Fever", "Cough", "Fatigue"]);
        assert_eq!(result.disease_labels(), vec!["Influenza"]);
        assert_eq!(kb.lock().unwrap().fact_count(), 3);
    }

    #[tokio::test]
    async fn no_matching_rule_is_empty_result() {
        let result = service("itchy elbow")
            .diagnose(&kb(), alice(), "my elbow itches")
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.symptom_labels(), vec!["Itchy elbow"]);
    }

    #[tokio::test]
    async fn failed_extraction_leaves_store_unchanged() {
        let kb = kb();
        service("fever").diagnose(&kb, alice(), "fever").await.unwrap();

        let err = service("No Symptoms")
            .diagnose(&kb, alice(), "hello there")
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::NoSymptoms));

        let mut guard = kb.lock().unwrap();
        let recorded = guard.read_symptoms(&alice()).unwrap();
        assert_eq!(recorded.len(), 1);
    }

    #[tokio::test]
    async fn blank_normalized_output_is_no_symptoms() {
        let err = service(" , ,").diagnose(&kb(), alice(), "?").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::NoSymptoms));
    }

    #[tokio::test]
    async fn duplicate_tokens_are_reported_once() {
        let kb = kb();
        let result = service("fever, Fever, fever")
            .diagnose(&kb, alice(), "fever fever")
            .await
            .unwrap();
        assert_eq!(result.symptom_labels(), vec!["Fever"]);
        assert_eq!(kb.lock().unwrap().fact_count(), 1);
    }

    #[tokio::test]
    async fn repeated_request_with_qualifiers_keeps_one_fact_each() {
        let kb = kb();
        let svc = service("Fever (high), cough");
        for _ in 0..3 {
            svc.diagnose(&kb, alice(), "high fever and a cough")
                .await
                .unwrap();
        }

        let mut guard = kb.lock().unwrap();
        assert_eq!(guard.fact_count(), 2);
        let recorded = flatten_symptom_results(&guard.read_symptoms(&alice()).unwrap());
        assert!(recorded.contains(&"fever_high".to_string()));
    }

    #[tokio::test]
    async fn extractor_outage_is_extraction_error() {
        let svc = DiagnosisService::new(
            SymptomExtractor::new(Arc::new(MockLlmClient::failing(|| {
                ExtractionError::Connection("http://llm".into())
            }))),
            RuleSource::Bundled,
            DEFAULT_PROOF_DEPTH,
        );
        let kb = kb();
        let err = svc.diagnose(&kb, alice(), "fever").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::Extraction(ref e) if e.is_unavailable()));
        assert_eq!(kb.lock().unwrap().fact_count(), 0);
    }

    #[tokio::test]
    async fn missing_rule_file_is_knowledge_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = DiagnosisService::new(
            SymptomExtractor::new(Arc::new(MockLlmClient::new("fever"))),
            RuleSource::File(dir.path().join("missing.metta")),
            DEFAULT_PROOF_DEPTH,
        );
        let err = svc.diagnose(&kb(), alice(), "fever").await.unwrap_err();
        assert!(matches!(
            err,
            DiagnosisError::Knowledge(KbError::RulesIo { .. })
        ));
    }

    #[test]
    fn knowledge_phase_respects_depth() {
        let mut kb = KnowledgeBase::default();
        let symptoms: Vec<Symptom> = ["fever", "cough", "fatigue"]
            .into_iter()
            .map(Symptom::new)
            .collect();

        let shallow =
            run_knowledge_phase(&mut kb, &RuleSource::Bundled, &alice(), &symptoms, 1).unwrap();
        assert!(shallow.is_empty());

        let deep =
            run_knowledge_phase(&mut kb, &RuleSource::Bundled, &alice(), &symptoms, 3).unwrap();
        assert!(deep.contains("influenza"));
    }

    #[test]
    fn knowledge_phase_sees_rule_file_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.metta");
        let source = RuleSource::File(path.clone());
        let symptoms = vec![Symptom::new("fever")];
        let mut kb = KnowledgeBase::default();

        std::fs::write(&path, "; nothing yet\n").unwrap();
        assert!(run_knowledge_phase(&mut kb, &source, &alice(), &symptoms, 3)
            .unwrap()
            .is_empty());

        std::fs::write(
            &path,
            "(: hot (-> (Evaluation has_symptom $p fever) (Result has_disease $p heatstroke)))",
        )
        .unwrap();
        let diseases = run_knowledge_phase(&mut kb, &source, &alice(), &symptoms, 3).unwrap();
        assert_eq!(diseases.into_iter().collect::<Vec<_>>(), vec!["heatstroke"]);
    }
}
