//! Sibling sets for one line's reference group.

use crate::extract::reference_literal;

/// A co-mentioned reference on the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sibling {
    /// Position of the sibling token in the line's group.
    pub index: usize,
    /// Canonical literal, e.g. `[[Bob]]`.
    pub literal: String,
}

/// Siblings of the token at `index`: every other token in the group, in
/// order of appearance. Duplicates within the line are kept here and only
/// collapse at merge time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingSet {
    /// Position of the token these siblings belong to.
    pub index: usize,
    /// Co-mentioned references.
    pub siblings: Vec<Sibling>,
}

/// Compute the sibling set of every token in a group.
///
/// Groups with fewer than two tokens have no siblings and produce an empty
/// result.
pub fn compute_sibling_sets<S: AsRef<str>>(tokens: &[S]) -> Vec<SiblingSet> {
    if tokens.len() < 2 {
        return Vec::new();
    }

    let literals: Vec<String> = tokens
        .iter()
        .map(|token| reference_literal(token.as_ref()))
        .collect();

    (0..tokens.len())
        .map(|index| SiblingSet {
            index,
            siblings: literals
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(other, literal)| Sibling {
                    index: other,
                    literal: literal.clone(),
                })
                .collect(),
        })
        .collect()
}
