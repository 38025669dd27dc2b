//! Extractor output → canonical symptom tokens.

use crate::models::Symptom;

/// Characters an LLM wraps list items in.
const DECORATION: &[char] = &['"', '\'', '`', '*', '-', '•', '.'];

/// Characters with meaning to the atom reader; treated as word breaks.
const RESERVED: &[char] = &['(', ')', ';', '"', '$'];

/// Split a comma-separated symptom string into canonical tokens.
///
/// Each segment is trimmed, lower-cased and stripped of list decoration;
/// runs of whitespace or reader syntax inside a segment become a single `_`,
/// so every token reads back as one plain symbol. Empty segments are dropped.
/// Order is preserved and duplicates are kept.
pub fn normalize_symptoms(extracted: &str) -> Vec<Symptom> {
    extracted
        .split(',')
        .filter_map(|segment| {
            let cleaned = segment
                .trim_matches(|c: char| c.is_whitespace() || DECORATION.contains(&c))
                .to_lowercase();
            let words: Vec<&str> = cleaned
                .split(|c: char| c.is_whitespace() || RESERVED.contains(&c))
                .filter(|word| !word.is_empty())
                .collect();
            if words.is_empty() {
                return None;
            }
            Some(Symptom::new(words.join("_")))
        })
        .collect()
}
