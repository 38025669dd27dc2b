//! Bounded-depth backward chaining over facts and implication rules.
//!
//! A fact is `(: <proof> <statement>)`. A rule is
//! `(: <name> (-> <premise>… <conclusion>))`. Proving a goal at depth `d`:
//! - any fact whose statement unifies with the goal is a proof;
//! - if `d > 0`, any rule whose conclusion unifies with the goal yields a
//!   proof `(<name> <premise proofs>…)` once every premise is proved at `d - 1`.
//!
//! Rule variables are renamed apart on every use. The depth bound guarantees
//! termination; `max_proofs` caps the fan-out at every level.

use super::atom::Atom;
use super::space::{resolve, unify, AtomSpace, Bindings};

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub premises: Vec<Atom>,
    pub conclusion: Atom,
}

impl Rule {
    /// Recognize `(: name (-> premise… conclusion))`.
    pub fn from_atom(atom: &Atom) -> Option<Rule> {
        let (name, body) = atom.as_typed()?;
        let name = name.as_symbol()?;
        let items = body.as_expr()?;
        let (arrow, rest) = items.split_first()?;
        if arrow.as_symbol() != Some("->") {
            return None;
        }
        let (conclusion, premises) = rest.split_last()?;
        Some(Rule {
            name: name.to_string(),
            premises: premises.to_vec(),
            conclusion: conclusion.clone(),
        })
    }

    fn renamed(&self, suffix: u64) -> Rule {
        Rule {
            name: self.name.clone(),
            premises: self.premises.iter().map(|p| rename(p, suffix)).collect(),
            conclusion: rename(&self.conclusion, suffix),
        }
    }
}

fn rename(atom: &Atom, suffix: u64) -> Atom {
    match atom {
        Atom::Variable(name) => Atom::Variable(format!("{name}#{suffix}")),
        Atom::Expr(items) => Atom::Expr(items.iter().map(|a| rename(a, suffix)).collect()),
        Atom::Symbol(_) => atom.clone(),
    }
}

/// One proof search over a fixed set of facts and rules.
pub struct ProofSearch<'a> {
    facts: Vec<&'a AtomSpace>,
    rules: &'a [Rule],
    max_proofs: usize,
    next_suffix: u64,
    truncated: bool,
}

impl<'a> ProofSearch<'a> {
    pub fn new(facts: Vec<&'a AtomSpace>, rules: &'a [Rule], max_proofs: usize) -> Self {
        Self {
            facts,
            rules,
            max_proofs: max_proofs.max(1),
            next_suffix: 0,
            truncated: false,
        }
    }

    /// Prove `goal` within `depth` rule applications.
    ///
    /// Returns `(: <proof> <goal instance>)` for each proof found.
    pub fn prove(&mut self, goal: &Atom, depth: u32) -> Vec<Atom> {
        self.solve(goal, depth, &Bindings::new())
            .into_iter()
            .map(|(proof, bindings)| Atom::typed(proof, resolve(goal, &bindings)))
            .collect()
    }

    /// Whether any level hit `max_proofs` and dropped results.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn fresh_suffix(&mut self) -> u64 {
        self.next_suffix += 1;
        self.next_suffix
    }

    fn push_capped(&mut self, out: &mut Vec<(Atom, Bindings)>, item: (Atom, Bindings)) -> bool {
        if out.len() >= self.max_proofs {
            self.truncated = true;
            return false;
        }
        out.push(item);
        true
    }

    fn solve(&mut self, goal: &Atom, depth: u32, bindings: &Bindings) -> Vec<(Atom, Bindings)> {
        let mut out = Vec::new();

        let facts = self.facts.clone();
        for fact in facts.iter().flat_map(|space| space.iter()) {
            let Some((proof, statement)) = fact.as_typed() else {
                continue;
            };
            if let Some(extended) = unify(goal, statement, bindings) {
                if !self.push_capped(&mut out, (proof.clone(), extended)) {
                    return out;
                }
            }
        }

        if depth == 0 {
            return out;
        }

        for rule in self.rules {
            let suffix = self.fresh_suffix();
            let rule = rule.renamed(suffix);
            let Some(matched) = unify(goal, &rule.conclusion, bindings) else {
                continue;
            };
            for (premise_proofs, extended) in self.solve_all(&rule.premises, depth - 1, &matched) {
                let mut proof = Vec::with_capacity(premise_proofs.len() + 1);
                proof.push(Atom::sym(rule.name.clone()));
                proof.extend(premise_proofs);
                if !self.push_capped(&mut out, (Atom::Expr(proof), extended)) {
                    return out;
                }
            }
        }

        out
    }

    fn solve_all(
        &mut self,
        goals: &[Atom],
        depth: u32,
        bindings: &Bindings,
    ) -> Vec<(Vec<Atom>, Bindings)> {
        let Some((first, rest)) = goals.split_first() else {
            return vec![(Vec::new(), bindings.clone())];
        };

        let mut out = Vec::new();
        for (proof, extended) in self.solve(first, depth, bindings) {
            for (mut rest_proofs, final_bindings) in self.solve_all(rest, depth, &extended) {
                if out.len() >= self.max_proofs {
                    self.truncated = true;
                    return out;
                }
                rest_proofs.insert(0, proof.clone());
                out.push((rest_proofs, final_bindings));
            }
        }
        out
    }
}
