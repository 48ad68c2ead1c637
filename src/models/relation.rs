//! Relation normalization at the ingestion boundary.
//!
//! Raw relation records arrive in heterogeneous shapes depending on which
//! pipeline produced the book data: character ids may be named `id1`/`id2`
//! or `source`/`target`, and `relation` may be a string, an array, or absent.
//! Everything downstream works on one normalized type; nothing else in the
//! crate branches on record shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A relation record canonicalized from an arbitrary raw shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRelation {
    pub id1: i64,
    pub id2: i64,
    /// Raw positivity as stored; clamping happens at consumption time.
    pub positivity: Option<f64>,
    pub relation: Vec<String>,
}

impl NormalizedRelation {
    /// A record is usable only when both ids are nonzero and distinct.
    /// Zero ids and self-loops come from malformed extraction output.
    pub fn is_valid(&self) -> bool {
        self.id1 != 0 && self.id2 != 0 && self.id1 != self.id2
    }

    /// Positivity clamped to `[-1, 1]`, the only form callers may consume.
    pub fn clamped_positivity(&self) -> Option<f64> {
        self.positivity.map(|p| p.clamp(-1.0, 1.0))
    }
}

/// Unordered character-pair identity within one book.
///
/// The constructor sorts the ids so that `(3, 7)` and `(7, 3)` produce the
/// same key, which keeps cache entries from duplicating per argument order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub book_id: String,
    pub id1: i64,
    pub id2: i64,
}

impl PairKey {
    pub fn new(book_id: impl Into<String>, a: i64, b: i64) -> Self {
        let (id1, id2) = if a <= b { (a, b) } else { (b, a) };
        Self {
            book_id: book_id.into(),
            id1,
            id2,
        }
    }
}

/// Coerce a JSON value to a finite number, accepting numeric strings.
fn coerce_id(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n as i64)
}

/// Collect relation labels from a string, an array of strings, or nothing.
fn coerce_labels(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize a raw relation record of unknown shape.
///
/// Returns `None` when either id fails to coerce to a finite number. The
/// result may still be invalid (zero id, self-loop); callers check
/// [`NormalizedRelation::is_valid`] before matching pairs.
pub fn normalize_relation(raw: &Value) -> Option<NormalizedRelation> {
    let obj = raw.as_object()?;

    let id1 = coerce_id(obj.get("id1").or_else(|| obj.get("source")))?;
    let id2 = coerce_id(obj.get("id2").or_else(|| obj.get("target")))?;

    let positivity = obj.get("positivity").and_then(|v| v.as_f64());
    let relation = coerce_labels(obj.get("relation"));

    Some(NormalizedRelation {
        id1,
        id2,
        positivity,
        relation,
    })
}

/// Whether a normalized relation is a valid record for the unordered pair
/// `{a, b}`. Symmetric in both the record's ids and the argument order.
pub fn is_same_pair(rel: &NormalizedRelation, a: i64, b: i64) -> bool {
    if !rel.is_valid() {
        return false;
    }
    (rel.id1 == a && rel.id2 == b) || (rel.id1 == b && rel.id2 == a)
}
