//! Response normalisation.
//!
//! Two normalisers are provided:
//! - `normalise`: SectionDataSet response → canonical `ExpressionRecord`
//! - `gene_infos`: Gene model query response → `GeneInfo` list

pub mod expression;
pub mod gene;

pub use expression::{normalise, NoData};
pub use gene::gene_infos;

use brainmap_common::AtlasId;
use serde_json::{Map, Value};

/// The head of a response's `msg`: the object itself, or the first list entry
/// whatever its type. `None` when `msg` is missing, empty or a scalar.
pub(crate) fn first_row(raw: &Value) -> Option<&Value> {
    match raw.get("msg")? {
        Value::Array(items) => items.first(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    }
}

// ── Typed field lookups ──────────────────────────────────────────────────────
// A key that is missing, null, or of the wrong JSON type reads as `None`.

/// Identifiers pass through whatever number or string the atlas sent.
pub(crate) fn field_id(obj: &Map<String, Value>, key: &str) -> Option<AtlasId> {
    match obj.get(key)? {
        Value::Number(n) => Some(AtlasId::Number(n.clone())),
        Value::String(s) => Some(AtlasId::Text(s.clone())),
        _ => None,
    }
}

pub(crate) fn field_u64(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(Value::as_u64)
}

pub(crate) fn field_f64(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

pub(crate) fn field_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
