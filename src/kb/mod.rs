//! In-memory symbolic knowledge base.
//!
//! Atoms are s-expressions; facts and rules live in [`AtomSpace`]s and are
//! evaluated by a bounded-depth backward-chaining [`ProofSearch`]. Callers
//! talk to the store through typed [`KbQuery`] values and the [`FactStore`]
//! trait, and batch mutations through [`KbTransaction`].

pub mod atom;
pub mod engine;
pub mod query;
pub mod rules;
pub mod space;
pub mod store;
pub mod transaction;

use std::path::PathBuf;

use thiserror::Error;

pub use atom::Atom;
pub use engine::{ProofSearch, Rule};
pub use query::{KbQuery, QueryOutcome};
pub use rules::{RuleSet, RuleSource, BUNDLED_RULES};
pub use space::AtomSpace;
pub use store::{FactStore, KnowledgeBase, DEFAULT_MAX_PROOFS};
pub use transaction::{CommitSummary, KbTransaction};

#[derive(Debug, Error)]
pub enum KbError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Cannot read rule file {path}: {source}")]
    RulesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No rule set loaded")]
    RulesNotLoaded,

    #[error("Query {query} returned unexpected outcome {outcome}")]
    UnexpectedOutcome {
        query: &'static str,
        outcome: &'static str,
    },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Transaction aborted at step {step}: {source}")]
    TransactionAborted {
        step: usize,
        #[source]
        source: Box<KbError>,
    },
}
