//! Diagnosis rule sets: parsing and (re)loading.

use std::fmt;
use std::path::PathBuf;

use super::atom::{parse_atoms_with_lines, Atom};
use super::engine::Rule;
use super::space::AtomSpace;
use super::KbError;

/// Rule set compiled into the binary.
pub const BUNDLED_RULES: &str = include_str!("../../rules/diagnosis.metta");

/// Parsed rule file: implication rules plus any static facts (axioms).
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    pub axioms: AtomSpace,
}

impl RuleSet {
    /// Every top-level form must be a typing judgement `(: name body)`.
    /// Bodies of the form `(-> …)` become rules, everything else is an axiom.
    pub fn parse(src: &str) -> Result<Self, KbError> {
        let mut set = RuleSet::default();

        for (line, atom) in parse_atoms_with_lines(src)? {
            let Some((name, body)) = atom.as_typed() else {
                return Err(KbError::Parse {
                    line,
                    message: format!("expected (: <name> <body>), found {atom}"),
                });
            };
            if name.as_symbol().is_none() {
                return Err(KbError::Parse {
                    line,
                    message: format!("rule name must be a symbol, found {name}"),
                });
            }

            if is_implication(body) {
                let rule = Rule::from_atom(&atom).ok_or_else(|| KbError::Parse {
                    line,
                    message: format!("implication without a conclusion: {atom}"),
                })?;
                set.rules.push(rule);
            } else {
                set.axioms.add(atom);
            }
        }

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.axioms.is_empty()
    }
}

fn is_implication(body: &Atom) -> bool {
    body.as_expr()
        .and_then(|items| items.first())
        .and_then(Atom::as_symbol)
        == Some("->")
}

/// Where the rule set comes from. File sources are re-read on every load so
/// edits take effect without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Bundled,
    File(PathBuf),
}

impl RuleSource {
    pub fn load(&self) -> Result<RuleSet, KbError> {
        match self {
            RuleSource::Bundled => RuleSet::parse(BUNDLED_RULES),
            RuleSource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| KbError::RulesIo {
                    path: path.clone(),
                    source,
                })?;
                RuleSet::parse(&text)
            }
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Bundled => f.write_str("bundled"),
            RuleSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
