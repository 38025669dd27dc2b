//! Buffered symptom mutations applied as a unit.
//!
//! The store has no native transactions. `KbTransaction` records intended
//! removals/insertions, applies them in order, and on the first failure
//! undoes every step already applied (in reverse) before returning the error.

use crate::models::{PatientName, Symptom, SymptomFact};

use super::store::FactStore;
use super::KbError;

#[derive(Debug, Clone)]
enum Mutation {
    Remove { patient: PatientName, symptom: Symptom },
    Insert(SymptomFact),
}

/// How to revert one applied mutation.
#[derive(Debug)]
enum Undo {
    Reinsert(Vec<SymptomFact>),
    Delete { patient: PatientName, symptom: Symptom },
}

/// What a committed transaction changed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommitSummary {
    pub removed: Vec<SymptomFact>,
    pub inserted: Vec<SymptomFact>,
}

#[derive(Debug, Default)]
pub struct KbTransaction {
    pending: Vec<Mutation>,
}

impl KbTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, patient: &PatientName, symptom: &Symptom) {
        self.pending.push(Mutation::Remove {
            patient: patient.clone(),
            symptom: symptom.clone(),
        });
    }

    pub fn insert(&mut self, fact: SymptomFact) {
        self.pending.push(Mutation::Insert(fact));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn commit<S: FactStore + ?Sized>(self, store: &mut S) -> Result<CommitSummary, KbError> {
        let mut undo_log: Vec<Undo> = Vec::with_capacity(self.pending.len());
        let mut summary = CommitSummary::default();

        for (step, mutation) in self.pending.into_iter().enumerate() {
            let applied = match mutation {
                Mutation::Remove { patient, symptom } => {
                    store.delete_symptom(&patient, &symptom).map(|removed| {
                        summary.removed.extend(removed.iter().cloned());
                        Undo::Reinsert(removed)
                    })
                }
                Mutation::Insert(fact) => store.insert_symptom(fact.clone()).map(|()| {
                    summary.inserted.push(fact.clone());
                    Undo::Delete {
                        patient: fact.patient,
                        symptom: fact.symptom,
                    }
                }),
            };

            match applied {
                Ok(undo) => undo_log.push(undo),
                Err(source) => {
                    tracing::warn!(step, error = %source, "KB transaction failed; rolling back");
                    rollback(store, undo_log);
                    return Err(KbError::TransactionAborted {
                        step,
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(summary)
    }
}

fn rollback<S: FactStore + ?Sized>(store: &mut S, undo_log: Vec<Undo>) {
    for undo in undo_log.into_iter().rev() {
        let result = match undo {
            Undo::Reinsert(facts) => facts
                .into_iter()
                .try_for_each(|fact| store.insert_symptom(fact)),
            Undo::Delete { patient, symptom } => {
                store.delete_symptom(&patient, &symptom).map(|_| ())
            }
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "KB rollback step failed; store may be inconsistent");
        }
    }
}
