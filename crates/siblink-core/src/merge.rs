//! Idempotent merge of sibling literals into a frontmatter property.

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;
use crate::types::{DocumentId, Frontmatter};
use serde_yaml::Value;
use tracing::{debug, trace};

/// The property holds a value that cannot be treated as a list of
/// references (a nested mapping or a tagged value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibleProperty {
    /// Property name.
    pub property: String,
}

/// Union `literals` into the list-valued `property` of `frontmatter`.
///
/// - An absent or falsy property (null, `false`, `0`, `''`) starts out as an
///   empty list.
/// - Any other scalar predating list usage becomes the list's only existing
///   entry.
/// - Each literal not already present (exact string match) is appended.
///
/// Existing entries keep their order; other keys are untouched. Returns the
/// literals that were appended, in order.
pub fn merge_into<S: AsRef<str>>(
    frontmatter: &mut Frontmatter,
    property: &str,
    literals: &[S],
) -> Result<Vec<String>, IncompatibleProperty> {
    let slot = frontmatter
        .entry(Value::String(property.to_string()))
        .or_insert(Value::Null);

    let mut entries = match std::mem::take(slot) {
        Value::Null | Value::Bool(false) => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Number(n) if n.as_f64().is_some_and(|f| f == 0.0 || f.is_nan()) => Vec::new(),
        Value::Sequence(seq) => seq,
        scalar @ (Value::String(_) | Value::Bool(_) | Value::Number(_)) => {
            trace!(property, "Coercing scalar property to a list");
            vec![scalar]
        }
        other => {
            *slot = other;
            return Err(IncompatibleProperty {
                property: property.to_string(),
            });
        }
    };

    let mut added = Vec::new();
    for literal in literals {
        let literal = literal.as_ref();
        let present = entries
            .iter()
            .any(|entry| entry.as_str() == Some(literal));
        if !present {
            entries.push(Value::String(literal.to_string()));
            added.push(literal.to_string());
        }
    }

    *slot = Value::Sequence(entries);
    Ok(added)
}

/// Merge `literals` into `target`'s `property` through the store's scoped
/// read-modify-write. Nothing is written when every literal is already
/// present.
///
/// Returns the literals that were appended. An incompatible property value is
/// reported as a [`StoreError::Parse`] so it is handled like any other
/// malformed metadata block.
pub async fn merge_siblings<S: AsRef<str> + Sync>(
    store: &dyn DocumentStore,
    target: &DocumentId,
    literals: &[S],
    property: &str,
) -> StoreResult<Vec<String>> {
    let mut outcome: Result<Vec<String>, IncompatibleProperty> = Ok(Vec::new());

    let mut mutate = |frontmatter: &mut Frontmatter| {
        outcome = merge_into(frontmatter, property, literals);
        matches!(outcome, Ok(ref added) if !added.is_empty())
    };
    store.process_frontmatter(target, &mut mutate).await?;

    match outcome {
        Ok(added) => {
            for literal in &added {
                debug!(document = %target, mention = %literal, "Added mention");
            }
            Ok(added)
        }
        Err(IncompatibleProperty { property }) => Err(StoreError::Parse {
            id: target.clone(),
            message: format!("property '{}' is neither a scalar nor a list", property),
        }),
    }
}
