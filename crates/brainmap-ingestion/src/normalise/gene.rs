//! Gene model query normalisation.

use brainmap_common::GeneInfo;
use serde_json::{Map, Value};

use super::{field_str, field_u64, first_row};

/// Every object entry of a Gene query's `msg`, in response order.
/// Returns an empty vec when `msg` is missing or holds no objects.
pub fn gene_infos(raw: &Value) -> Vec<GeneInfo> {
    match raw.get("msg") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(gene_info)
            .collect(),
        Some(Value::Object(obj)) => vec![gene_info(obj)],
        _ => vec![],
    }
}

/// Atlas id of the first `msg` entry of a Gene query response. A first entry
/// that is not a gene object has no id; later entries are not consulted.
pub fn first_gene_id(raw: &Value) -> Option<u64> {
    first_row(raw)?.get("id").and_then(Value::as_u64)
}

fn gene_info(obj: &Map<String, Value>) -> GeneInfo {
    GeneInfo {
        id: field_u64(obj, "id"),
        acronym: field_str(obj, "acronym"),
        gene_symbol: field_str(obj, "gene_symbol"),
        name: field_str(obj, "name"),
        entrez_id: field_u64(obj, "entrez_id"),
        chromosome_id: field_u64(obj, "chromosome_id"),
    }
}
