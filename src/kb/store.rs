//! Fact store interface and the in-memory knowledge base behind it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{PatientName, Symptom, SymptomFact};

use super::atom::Atom;
use super::engine::ProofSearch;
use super::query::{diagnosis_goal, fact_atom, fact_from_atom, symptom_statement, KbQuery, QueryOutcome};
use super::rules::RuleSet;
use super::space::{resolve, AtomSpace};
use super::KbError;

/// Default cap on proofs collected per inference query.
pub const DEFAULT_MAX_PROOFS: usize = 4096;

/// Anything that can evaluate [`KbQuery`] values.
///
/// Backends implement [`FactStore::execute`]; the typed helpers are provided.
pub trait FactStore {
    fn execute(&mut self, query: KbQuery) -> Result<QueryOutcome, KbError>;

    fn read_symptoms(&mut self, patient: &PatientName) -> Result<Vec<Atom>, KbError> {
        match self.execute(KbQuery::ReadSymptoms {
            patient: patient.clone(),
        })? {
            QueryOutcome::Matches(atoms) => Ok(atoms),
            other => Err(unexpected("read_symptoms", &other)),
        }
    }

    fn last_sequence(&mut self, patient: &PatientName) -> Result<u64, KbError> {
        match self.execute(KbQuery::LastSequence {
            patient: patient.clone(),
        })? {
            QueryOutcome::Sequence(seq) => Ok(seq),
            other => Err(unexpected("last_sequence", &other)),
        }
    }

    fn insert_symptom(&mut self, fact: SymptomFact) -> Result<(), KbError> {
        match self.execute(KbQuery::AddSymptom { fact })? {
            QueryOutcome::Done => Ok(()),
            other => Err(unexpected("add_symptom", &other)),
        }
    }

    fn delete_symptom(
        &mut self,
        patient: &PatientName,
        symptom: &Symptom,
    ) -> Result<Vec<SymptomFact>, KbError> {
        match self.execute(KbQuery::RemoveSymptom {
            patient: patient.clone(),
            symptom: symptom.clone(),
        })? {
            QueryOutcome::Removed(facts) => Ok(facts),
            other => Err(unexpected("remove_symptom", &other)),
        }
    }

    fn load_rules(&mut self, rules: Arc<RuleSet>) -> Result<(), KbError> {
        match self.execute(KbQuery::LoadRules { rules })? {
            QueryOutcome::Done => Ok(()),
            other => Err(unexpected("load_rules", &other)),
        }
    }

    fn infer_diagnoses(&mut self, patient: &PatientName, depth: u32) -> Result<Vec<Atom>, KbError> {
        match self.execute(KbQuery::InferDiagnoses {
            patient: patient.clone(),
            depth,
        })? {
            QueryOutcome::Proofs(terms) => Ok(terms),
            other => Err(unexpected("infer_diagnoses", &other)),
        }
    }
}

fn unexpected(query: &'static str, outcome: &QueryOutcome) -> KbError {
    KbError::UnexpectedOutcome {
        query,
        outcome: outcome.kind(),
    }
}

// ═══════════════════════════════════════════════════════════
// KnowledgeBase: process-lifetime, in-memory
// ═══════════════════════════════════════════════════════════

/// Symptom facts plus the active rule set.
///
/// Not internally synchronized: callers own it behind a lock and run each
/// request's read-modify-write sequence while holding that lock.
#[derive(Debug)]
pub struct KnowledgeBase {
    facts: AtomSpace,
    rules: Option<Arc<RuleSet>>,
    /// Per-patient high-water mark of assigned symptom sequence numbers.
    sequences: HashMap<PatientName, u64>,
    max_proofs: usize,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROOFS)
    }
}

impl KnowledgeBase {
    pub fn new(max_proofs: usize) -> Self {
        Self {
            facts: AtomSpace::new(),
            rules: None,
            sequences: HashMap::new(),
            max_proofs,
        }
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    fn read(&self, patient: &PatientName) -> Vec<Atom> {
        let pattern = Atom::typed(Atom::var("x"), symptom_statement(patient, Atom::var("y")));
        self.facts
            .query(&pattern)
            .iter()
            .map(|b| resolve(&Atom::var("y"), b))
            .collect()
    }

    fn add(&mut self, fact: SymptomFact) {
        let high = self.sequences.entry(fact.patient.clone()).or_insert(0);
        *high = (*high).max(fact.id.seq);
        self.facts.add(fact_atom(&fact));
    }

    fn remove(&mut self, patient: &PatientName, symptom: &Symptom) -> Vec<SymptomFact> {
        let pattern = Atom::typed(
            Atom::var("x"),
            symptom_statement(patient, Atom::sym(symptom.as_str())),
        );
        self.facts
            .remove_matching(&pattern)
            .iter()
            .filter_map(|atom| {
                let fact = fact_from_atom(atom);
                if fact.is_none() {
                    tracing::warn!(%atom, "Removed symptom atom with unrecognized identifier");
                }
                fact
            })
            .collect()
    }

    fn infer(&self, patient: &PatientName, depth: u32) -> Result<Vec<Atom>, KbError> {
        let rules = self.rules.as_ref().ok_or(KbError::RulesNotLoaded)?;
        let mut search =
            ProofSearch::new(vec![&self.facts, &rules.axioms], &rules.rules, self.max_proofs);
        let proofs = search.prove(&diagnosis_goal(patient), depth);
        if search.truncated() {
            tracing::warn!(
                patient = %patient,
                depth,
                max_proofs = self.max_proofs,
                "Proof search hit the proof cap; results truncated"
            );
        }
        Ok(proofs)
    }
}

impl FactStore for KnowledgeBase {
    fn execute(&mut self, query: KbQuery) -> Result<QueryOutcome, KbError> {
        tracing::trace!(query = %query, "KB query");
        match query {
            KbQuery::ReadSymptoms { patient } => Ok(QueryOutcome::Matches(self.read(&patient))),
            KbQuery::LastSequence { patient } => Ok(QueryOutcome::Sequence(
                self.sequences.get(&patient).copied().unwrap_or(0),
            )),
            KbQuery::AddSymptom { fact } => {
                self.add(fact);
                Ok(QueryOutcome::Done)
            }
            KbQuery::RemoveSymptom { patient, symptom } => {
                Ok(QueryOutcome::Removed(self.remove(&patient, &symptom)))
            }
            KbQuery::LoadRules { rules } => {
                tracing::debug!(
                    rules = rules.rules.len(),
                    axioms = rules.axioms.len(),
                    "Rule set loaded"
                );
                self.rules = Some(rules);
                Ok(QueryOutcome::Done)
            }
            KbQuery::InferDiagnoses { patient, depth } => {
                Ok(QueryOutcome::Proofs(self.infer(&patient, depth)?))
            }
        }
    }
}
