//! In-memory atom store with pattern matching by unification.

use std::collections::HashMap;

use super::atom::Atom;

/// Variable name → bound value. Values may themselves contain variables;
/// [`resolve`] follows chains to a fixed point.
pub type Bindings = HashMap<String, Atom>;

/// Follow variable bindings until reaching a non-variable or an unbound variable.
fn walk<'a>(atom: &'a Atom, bindings: &'a Bindings) -> &'a Atom {
    let mut current = atom;
    while let Atom::Variable(name) = current {
        match bindings.get(name) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Substitute every bound variable in `atom`.
pub fn resolve(atom: &Atom, bindings: &Bindings) -> Atom {
    match walk(atom, bindings) {
        Atom::Expr(items) => Atom::Expr(items.iter().map(|a| resolve(a, bindings)).collect()),
        other => other.clone(),
    }
}

fn occurs(var: &str, atom: &Atom, bindings: &Bindings) -> bool {
    match walk(atom, bindings) {
        Atom::Variable(name) => name == var,
        Atom::Expr(items) => items.iter().any(|a| occurs(var, a, bindings)),
        Atom::Symbol(_) => false,
    }
}

fn unify_into(a: &Atom, b: &Atom, bindings: &mut Bindings) -> bool {
    let a = walk(a, bindings).clone();
    let b = walk(b, bindings).clone();
    match (&a, &b) {
        (Atom::Variable(x), Atom::Variable(y)) if x == y => true,
        (Atom::Variable(x), other) | (other, Atom::Variable(x)) => {
            if occurs(x, other, bindings) {
                return false;
            }
            bindings.insert(x.clone(), other.clone());
            true
        }
        (Atom::Symbol(x), Atom::Symbol(y)) => x == y,
        (Atom::Expr(xs), Atom::Expr(ys)) => {
            xs.len() == ys.len()
                && xs.iter().zip(ys).all(|(x, y)| unify_into(x, y, bindings))
        }
        _ => false,
    }
}

/// Unify two atoms under existing bindings. Returns the extended bindings,
/// or `None` if the atoms cannot be made equal.
pub fn unify(a: &Atom, b: &Atom, bindings: &Bindings) -> Option<Bindings> {
    let mut extended = bindings.clone();
    unify_into(a, b, &mut extended).then_some(extended)
}

/// Multiset of atoms. Insertion order is preserved so query results are
/// deterministic.
#[derive(Debug, Default, Clone)]
pub struct AtomSpace {
    atoms: Vec<Atom>,
}

impl AtomSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    /// Remove every atom that unifies with `pattern`; returns what was removed.
    pub fn remove_matching(&mut self, pattern: &Atom) -> Vec<Atom> {
        let empty = Bindings::new();
        let (removed, kept): (Vec<Atom>, Vec<Atom>) = std::mem::take(&mut self.atoms)
            .into_iter()
            .partition(|atom| unify(pattern, atom, &empty).is_some());
        self.atoms = kept;
        removed
    }

    /// Bindings for every stored atom that unifies with `pattern`.
    pub fn query(&self, pattern: &Atom) -> Vec<Bindings> {
        let empty = Bindings::new();
        self.atoms
            .iter()
            .filter_map(|atom| unify(pattern, atom, &empty))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
