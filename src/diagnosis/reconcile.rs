//! Diff-and-patch of a patient's recorded symptoms against a new observation.

use std::collections::HashSet;

use crate::kb::{Atom, FactStore, KbError, KbTransaction};
use crate::models::{PatientName, Symptom, SymptomFact, SymptomId};

/// What one reconciliation did. Used for logging only.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<SymptomFact>,
    pub removed: Vec<Symptom>,
    /// Removals skipped because nothing new was observed.
    pub suppressed: Vec<Symptom>,
}

impl ReconcileReport {
    pub fn mutated(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Flatten symptom atoms read from the store into plain tokens.
///
/// Only the store's wrapping is removed: a one-element expression is opened
/// and a quoted symbol is unquoted. Bare symbols come back unchanged.
/// Entries that end up empty are dropped.
pub fn flatten_symptom_results(atoms: &[Atom]) -> Vec<String> {
    atoms
        .iter()
        .filter_map(unwrap_symptom)
        .filter(|s| !s.is_empty())
        .collect()
}

fn unwrap_symptom(atom: &Atom) -> Option<String> {
    match atom {
        Atom::Expr(items) if items.len() == 1 => unwrap_symptom(&items[0]),
        Atom::Symbol(name) => {
            let unquoted = ['\'', '"']
                .iter()
                .find_map(|q| {
                    name.strip_prefix(*q)
                        .and_then(|rest| rest.strip_suffix(*q))
                })
                .unwrap_or(name.as_str());
            Some(unquoted.to_string())
        }
        _ => None,
    }
}

/// First occurrence wins.
pub fn dedupe_symptoms(observed: &[Symptom]) -> Vec<Symptom> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(observed.len());
    for symptom in observed {
        if seen.insert(symptom.as_str()) {
            unique.push(symptom.clone());
        }
    }
    unique
}

/// Bring the patient's stored symptoms in line with `observed`.
///
/// When nothing in `observed` is new the store is left untouched, even if
/// some recorded symptoms are no longer observed. Otherwise stale symptoms are
/// removed and new ones inserted with identifiers above every identifier the
/// patient has ever had. Mutations are applied as one transaction.
pub fn reconcile<S: FactStore + ?Sized>(
    store: &mut S,
    patient: &PatientName,
    observed: &[Symptom],
) -> Result<ReconcileReport, KbError> {
    let observed = dedupe_symptoms(observed);
    let existing = flatten_symptom_results(&store.read_symptoms(patient)?);

    let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let observed_set: HashSet<&str> = observed.iter().map(Symptom::as_str).collect();

    let to_add: Vec<&Symptom> = observed
        .iter()
        .filter(|s| !existing_set.contains(s.as_str()))
        .collect();
    let to_remove: Vec<Symptom> = dedupe_symptoms(
        &existing
            .iter()
            .filter(|s| !observed_set.contains(s.as_str()))
            .map(|s| Symptom::new(s.as_str()))
            .collect::<Vec<_>>(),
    );

    if to_add.is_empty() {
        if to_remove.is_empty() {
            tracing::info!(patient = %patient, "All symptoms already recorded");
        } else {
            tracing::info!(
                patient = %patient,
                suppressed = ?to_remove,
                "No new symptoms; leaving stale symptoms in place"
            );
        }
        return Ok(ReconcileReport {
            suppressed: to_remove,
            ..Default::default()
        });
    }

    let mut seq = (existing.len() as u64).max(store.last_sequence(patient)?);

    let mut tx = KbTransaction::new();
    for symptom in &to_remove {
        tx.remove(patient, symptom);
    }
    for symptom in &to_add {
        seq += 1;
        tx.insert(SymptomFact {
            id: SymptomId::new(patient, seq),
            patient: patient.clone(),
            symptom: (*symptom).clone(),
        });
    }
    let summary = tx.commit(store)?;

    let report = ReconcileReport {
        added: summary.inserted,
        removed: to_remove,
        suppressed: Vec::new(),
    };
    if !report.added.is_empty() {
        tracing::info!(
            patient = %patient,
            added = ?report.added.iter().map(|f| f.symptom.as_str()).collect::<Vec<_>>(),
            "Added new symptoms"
        );
    }
    if !report.removed.is_empty() {
        tracing::info!(patient = %patient, removed = ?report.removed, "Removed outdated symptoms");
    }
    Ok(report)
}

/// Re-read the store and log any observed symptom that is not recorded.
///
/// Returns the missing symptoms; never fails the request on a discrepancy.
pub fn verify_recorded<S: FactStore + ?Sized>(
    store: &mut S,
    patient: &PatientName,
    observed: &[Symptom],
) -> Result<Vec<Symptom>, KbError> {
    let current = flatten_symptom_results(&store.read_symptoms(patient)?);
    tracing::debug!(patient = %patient, current = ?current, "Current symptoms in KB");

    let missing: Vec<Symptom> = observed
        .iter()
        .filter(|s| !current.iter().any(|c| c == s.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        tracing::error!(
            patient = %patient,
            missing = ?missing,
            "Observed symptoms not found in KB after reconciliation"
        );
    }
    Ok(missing)
}
