//! S-expression atoms: the value type of the knowledge base.
//!
//! Syntax accepted by [`parse_atoms`]:
//! - `(` … `)` expressions, arbitrarily nested
//! - `$name` variables
//! - any other run of non-whitespace, non-paren characters is a symbol
//! - `"…"` string literals are kept verbatim (quotes included) as symbols
//! - `;` starts a comment that runs to end of line

use std::fmt;

use super::KbError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Symbol(String),
    /// Variable name without the leading `$`.
    Variable(String),
    Expr(Vec<Atom>),
}

impl Atom {
    pub fn sym(name: impl Into<String>) -> Self {
        Atom::Symbol(name.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Atom::Variable(name.into())
    }

    pub fn expr(items: impl IntoIterator<Item = Atom>) -> Self {
        Atom::Expr(items.into_iter().collect())
    }

    /// Typing judgement `(: proof statement)`, the shape of every fact.
    pub fn typed(proof: Atom, statement: Atom) -> Self {
        Atom::Expr(vec![Atom::sym(":"), proof, statement])
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&[Atom]> {
        match self {
            Atom::Expr(items) => Some(items),
            _ => None,
        }
    }

    /// Split `(: proof statement)` into its parts.
    pub fn as_typed(&self) -> Option<(&Atom, &Atom)> {
        match self.as_expr()? {
            [head, proof, statement] if head.as_symbol() == Some(":") => Some((proof, statement)),
            _ => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(s) => f.write_str(s),
            Atom::Variable(v) => write!(f, "${v}"),
            Atom::Expr(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, KbError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '(' => {
                tokens.push((line, Token::Open));
                chars.next();
            }
            ')' => {
                tokens.push((line, Token::Close));
                chars.next();
            }
            '"' => {
                let start = line;
                let mut word = String::from('"');
                chars.next();
                loop {
                    match chars.next() {
                        Some('"') => {
                            word.push('"');
                            break;
                        }
                        Some('\\') => {
                            word.push('\\');
                            if let Some(escaped) = chars.next() {
                                word.push(escaped);
                            }
                        }
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            word.push(c);
                        }
                        None => {
                            return Err(KbError::Parse {
                                line: start,
                                message: "unterminated string literal".into(),
                            })
                        }
                    }
                }
                tokens.push((start, Token::Word(word)));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' || c == ';' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push((line, Token::Word(word)));
            }
        }
    }

    Ok(tokens)
}

fn word_to_atom(word: String, line: usize) -> Result<Atom, KbError> {
    match word.strip_prefix('$') {
        Some("") => Err(KbError::Parse {
            line,
            message: "variable without a name".into(),
        }),
        Some(name) => Ok(Atom::var(name)),
        None => Ok(Atom::Symbol(word)),
    }
}

/// Parse every top-level atom in `src`, paired with the line it starts on.
pub fn parse_atoms_with_lines(src: &str) -> Result<Vec<(usize, Atom)>, KbError> {
    let mut top = Vec::new();
    // Open expressions: (start line, items so far).
    let mut stack: Vec<(usize, Vec<Atom>)> = Vec::new();

    for (line, token) in tokenize(src)? {
        match token {
            Token::Open => stack.push((line, Vec::new())),
            Token::Close => {
                let (start, items) = stack.pop().ok_or_else(|| KbError::Parse {
                    line,
                    message: "unexpected ')'".into(),
                })?;
                let atom = Atom::Expr(items);
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(atom),
                    None => top.push((start, atom)),
                }
            }
            Token::Word(word) => {
                let atom = word_to_atom(word, line)?;
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(atom),
                    None => top.push((line, atom)),
                }
            }
        }
    }

    if let Some((start, _)) = stack.last() {
        return Err(KbError::Parse {
            line: *start,
            message: "unclosed '('".into(),
        });
    }

    Ok(top)
}

pub fn parse_atoms(src: &str) -> Result<Vec<Atom>, KbError> {
    Ok(parse_atoms_with_lines(src)?
        .into_iter()
        .map(|(_, atom)| atom)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parse() {
        let src = "(: ALICE_SYM1 (Evaluation has_symptom Alice fever))";
        let atoms = parse_atoms(src).unwrap();
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].to_string(), src);
    }

    #[test]
    fn parses_variables_and_comments() {
        let src = "; leading comment\n(match $x ; trailing\n  foo)";
        let atoms = parse_atoms(src).unwrap();
        assert_eq!(
            atoms,
            vec![Atom::expr([Atom::sym("match"), Atom::var("x"), Atom::sym("foo")])]
        );
    }

    #[test]
    fn keeps_string_literals_verbatim() {
        let atoms = parse_atoms(r#"(note "two words")"#).unwrap();
        assert_eq!(
            atoms[0],
            Atom::expr([Atom::sym("note"), Atom::sym("\"two words\"")])
        );
    }

    #[test]
    fn reports_line_of_unclosed_expression() {
        let err = parse_atoms("(a b)\n\n(c (d e)").unwrap_err();
        match err {
            KbError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_stray_close_paren() {
        let err = parse_atoms("a)\n").unwrap_err();
        assert!(matches!(err, KbError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_anonymous_variable() {
        assert!(parse_atoms("(f $)").is_err());
    }

    #[test]
    fn tracks_start_lines() {
        let parsed = parse_atoms_with_lines("(a)\n(b\n c)\nd").unwrap();
        let lines: Vec<usize> = parsed.iter().map(|(l, _)| *l).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[test]
    fn as_typed_splits_judgement() {
        let atom = Atom::typed(Atom::sym("p"), Atom::sym("s"));
        let (proof, statement) = atom.as_typed().unwrap();
        assert_eq!(proof, &Atom::sym("p"));
        assert_eq!(statement, &Atom::sym("s"));
        assert!(Atom::sym("x").as_typed().is_none());
    }
}
