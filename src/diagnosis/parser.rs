//! Proof terms → disease names.

use std::collections::BTreeSet;

use crate::kb::Atom;
use crate::models::PatientName;

/// Collect the diseases concluded for `patient`.
///
/// Only `(: <proof> (Result has_disease <patient> <disease>))` with a symbol
/// disease counts. Other shapes, other patients and unbound variables are
/// ignored. Identical conclusions reached by different proofs collapse.
pub fn parse_diagnosed_diseases(terms: &[Atom], patient: &PatientName) -> BTreeSet<String> {
    terms
        .iter()
        .filter_map(|term| {
            let (_, statement) = term.as_typed()?;
            match statement.as_expr()? {
                [kind, relation, who, disease]
                    if kind.as_symbol() == Some("Result")
                        && relation.as_symbol() == Some("has_disease")
                        && who.as_symbol() == Some(patient.as_str()) =>
                {
                    disease.as_symbol().map(str::to_string)
                }
                _ => None,
            }
        })
        .collect()
}
