//! Typed knowledge-base queries.
//!
//! Callers describe *what* they want as a [`KbQuery`]; the store decides how
//! to evaluate it. [`KbQuery::render`] gives the equivalent s-expression
//! command for debug logs.

use std::fmt;
use std::sync::Arc;

use crate::models::{PatientName, Symptom, SymptomFact, SymptomId};

use super::atom::Atom;
use super::rules::RuleSet;

#[derive(Debug, Clone)]
pub enum KbQuery {
    /// Symptoms currently recorded for a patient.
    ReadSymptoms { patient: PatientName },
    /// Highest symptom sequence number ever assigned to a patient.
    LastSequence { patient: PatientName },
    AddSymptom { fact: SymptomFact },
    /// Remove every fact for this patient+symptom, whatever its identifier.
    RemoveSymptom { patient: PatientName, symptom: Symptom },
    /// Replace the active rule set. Loading the same set twice is a no-op.
    LoadRules { rules: Arc<RuleSet> },
    InferDiagnoses { patient: PatientName, depth: u32 },
}

impl KbQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            KbQuery::ReadSymptoms { .. } => "read_symptoms",
            KbQuery::LastSequence { .. } => "last_sequence",
            KbQuery::AddSymptom { .. } => "add_symptom",
            KbQuery::RemoveSymptom { .. } => "remove_symptom",
            KbQuery::LoadRules { .. } => "load_rules",
            KbQuery::InferDiagnoses { .. } => "infer_diagnoses",
        }
    }

    /// Equivalent command in s-expression form.
    pub fn render(&self) -> String {
        match self {
            KbQuery::ReadSymptoms { patient } => format!(
                "!(match &self {} $y)",
                Atom::typed(Atom::var("x"), symptom_statement(patient, Atom::var("y")))
            ),
            KbQuery::LastSequence { patient } => format!("!(symptom-sequence &self {patient})"),
            KbQuery::AddSymptom { fact } => format!("!(add-atom &self {})", fact_atom(fact)),
            KbQuery::RemoveSymptom { patient, symptom } => format!(
                "!(remove-atom &self {})",
                Atom::typed(
                    Atom::var("x"),
                    symptom_statement(patient, Atom::sym(symptom.as_str()))
                )
            ),
            KbQuery::LoadRules { rules } => format!(
                "!(import! &self rules) ; {} rules, {} axioms",
                rules.rules.len(),
                rules.axioms.len()
            ),
            KbQuery::InferDiagnoses { patient, depth } => format!(
                "!(syn &self (fromNumber {depth}) {})",
                Atom::typed(Atom::var("prf"), diagnosis_goal(patient))
            ),
        }
    }
}

impl fmt::Display for KbQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Raw matched atoms, in store order.
    Matches(Vec<Atom>),
    Sequence(u64),
    Removed(Vec<SymptomFact>),
    Proofs(Vec<Atom>),
    Done,
}

impl QueryOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOutcome::Matches(_) => "matches",
            QueryOutcome::Sequence(_) => "sequence",
            QueryOutcome::Removed(_) => "removed",
            QueryOutcome::Proofs(_) => "proofs",
            QueryOutcome::Done => "done",
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Atom shapes shared by the store and the query renderer
// ═══════════════════════════════════════════════════════════

/// `(Evaluation has_symptom <patient> <symptom>)`
pub fn symptom_statement(patient: &PatientName, symptom: Atom) -> Atom {
    Atom::expr([
        Atom::sym("Evaluation"),
        Atom::sym("has_symptom"),
        Atom::sym(patient.as_str()),
        symptom,
    ])
}

/// `(Result has_disease <patient> $disease)`
pub fn diagnosis_goal(patient: &PatientName) -> Atom {
    Atom::expr([
        Atom::sym("Result"),
        Atom::sym("has_disease"),
        Atom::sym(patient.as_str()),
        Atom::var("disease"),
    ])
}

/// `(: <ID> (Evaluation has_symptom <patient> <symptom>))`
pub fn fact_atom(fact: &SymptomFact) -> Atom {
    Atom::typed(
        Atom::sym(fact.id.to_string()),
        symptom_statement(&fact.patient, Atom::sym(fact.symptom.as_str())),
    )
}

/// Inverse of [`fact_atom`]. `None` if the atom is not a well-formed symptom fact.
pub fn fact_from_atom(atom: &Atom) -> Option<SymptomFact> {
    let (id, statement) = atom.as_typed()?;
    let id = SymptomId::parse(id.as_symbol()?)?;
    match statement.as_expr()? {
        [eval, rel, patient, symptom]
            if eval.as_symbol() == Some("Evaluation") && rel.as_symbol() == Some("has_symptom") =>
        {
            Some(SymptomFact {
                id,
                patient: PatientName::parse(patient.as_symbol()?).ok()?,
                symptom: Symptom::new(symptom.as_symbol()?),
            })
        }
        _ => None,
    }
}
