//! SectionDataSet response normalisation.
//!
//! The atlas wraps results in a `msg` field that may hold a single object or
//! an array of objects. The shape is resolved once into [`Msg`]; everything
//! after that works on a plain JSON object.
//!
//! ```ignore
//! let raw = client.fetch_expression_data(gene_id).await?;
//! match normalise(&raw) {
//!     Ok(record) => store.save_record("APP", &record)?,
//!     Err(no_data) => tracing::warn!("skipping APP: {no_data}"),
//! }
//! ```

use brainmap_common::{ExpressionRecord, StructureExpression};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{field_f64, field_id, field_str};

/// Why a response produced no record. Neither case is fatal; callers skip the
/// gene and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoData {
    /// The response lacks the expected top-level shape.
    #[error("malformed input: {0}")]
    MalformedInput(&'static str),

    /// `msg` is present but holds no entries.
    #[error("empty result")]
    EmptyResult,
}

/// The `msg` payload, resolved once.
enum Msg<'a> {
    Single(&'a Map<String, Value>),
    List(&'a [Value]),
    Absent,
}

impl<'a> Msg<'a> {
    fn resolve(value: &'a Value) -> Self {
        match value {
            Value::Object(obj) => Msg::Single(obj),
            Value::Array(items) => Msg::List(items),
            _ => Msg::Absent,
        }
    }

    /// The entry a record is built from: the object itself, or the head of the list.
    fn head(self) -> Result<&'a Map<String, Value>, NoData> {
        match self {
            Msg::Single(obj) => Ok(obj),
            Msg::List([]) => Err(NoData::EmptyResult),
            Msg::List([first, ..]) => first
                .as_object()
                .ok_or(NoData::MalformedInput("first msg entry is not an object")),
            Msg::Absent => Err(NoData::MalformedInput("msg is neither an object nor an array")),
        }
    }
}

/// Normalise a raw SectionDataSet response into an [`ExpressionRecord`].
///
/// Missing fields become `None`. Entries of `structure_unionizes` that are
/// not objects are skipped; the rest keep their input order. Pure and
/// idempotent.
pub fn normalise(raw: &Value) -> Result<ExpressionRecord, NoData> {
    let root = raw
        .as_object()
        .ok_or(NoData::MalformedInput("response is not an object"))?;
    let msg = root
        .get("msg")
        .ok_or(NoData::MalformedInput("response has no msg field"))?;
    let msg = Msg::resolve(msg).head()?;

    let structures: Vec<StructureExpression> = msg
        .get("structure_unionizes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(structure_expression)
                .collect()
        })
        .unwrap_or_default();

    Ok(ExpressionRecord {
        experiment_id: field_id(msg, "id"),
        gene_name: gene_name(msg),
        expression_level: field_f64(msg, "expression_level"),
        structures,
    })
}

fn structure_expression(obj: &Map<String, Value>) -> StructureExpression {
    StructureExpression {
        structure_id: field_id(obj, "structure_id"),
        expression_density: field_f64(obj, "expression_density"),
        expression_energy: field_f64(obj, "expression_energy"),
        volume: field_f64(obj, "volume"),
    }
}

/// `gene` is usually a symbol string; some includes embed the Gene object instead.
fn gene_name(msg: &Map<String, Value>) -> Option<String> {
    match msg.get("gene")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(gene) => field_str(gene, "acronym"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainmap_common::AtlasId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn structure(
        id: Option<AtlasId>,
        density: Option<f64>,
        energy: Option<f64>,
        volume: Option<f64>,
    ) -> StructureExpression {
        StructureExpression {
            structure_id: id,
            expression_density: density,
            expression_energy: energy,
            volume,
        }
    }

    #[test]
    fn test_empty_object_is_malformed() {
        assert!(matches!(normalise(&json!({})), Err(NoData::MalformedInput(_))));
    }

    #[test]
    fn test_empty_msg_list_is_empty_result() {
        assert_eq!(normalise(&json!({"msg": []})), Err(NoData::EmptyResult));
    }

    #[test]
    fn test_non_object_root_is_malformed() {
        for raw in [json!(null), json!([1, 2]), json!("msg"), json!(3)] {
            assert!(matches!(normalise(&raw), Err(NoData::MalformedInput(_))), "{raw}");
        }
    }

    #[test]
    fn test_scalar_or_null_msg_is_malformed() {
        for msg in [json!(null), json!("oops"), json!(12), json!(true)] {
            let raw = json!({ "msg": msg });
            assert!(matches!(normalise(&raw), Err(NoData::MalformedInput(_))), "{raw}");
        }
    }

    #[test]
    fn test_list_with_non_object_head_is_malformed() {
        let raw = json!({"msg": ["not-a-mapping", {"id": 1}]});
        assert!(matches!(normalise(&raw), Err(NoData::MalformedInput(_))));
    }

    #[test]
    fn test_skips_non_object_structures_and_keeps_order() {
        let raw = json!({"msg": [{
            "id": 42,
            "structure_unionizes": [
                {"structure_id": 7, "expression_density": 0.5},
                "not-a-mapping",
                {"structure_id": 8}
            ]
        }]});

        let rec = normalise(&raw).unwrap();
        assert_eq!(rec.experiment_id, Some(42u64.into()));
        assert_eq!(
            rec.structures,
            vec![
                structure(Some(7u64.into()), Some(0.5), None, None),
                structure(Some(8u64.into()), None, None, None),
            ]
        );
    }

    #[test]
    fn test_single_object_msg_fills_scalar_fields() {
        let raw = json!({"msg": {
            "id": 71717640,
            "gene": "APP",
            "expression_level": 3.25,
            "unknown_field": {"ignored": true},
            "structure_unionizes": [
                {"structure_id": 315, "expression_density": 0.012, "expression_energy": 1.5, "volume": 8.75}
            ]
        }});

        let rec = normalise(&raw).unwrap();
        assert_eq!(
            rec,
            ExpressionRecord {
                experiment_id: Some(71717640u64.into()),
                gene_name: Some("APP".to_string()),
                expression_level: Some(3.25),
                structures: vec![structure(Some(315u64.into()), Some(0.012), Some(1.5), Some(8.75))],
            }
        );
    }

    #[test]
    fn test_missing_fields_are_absent_not_zero() {
        let rec = normalise(&json!({"msg": [{}]})).unwrap();
        assert_eq!(
            rec,
            ExpressionRecord {
                experiment_id: None,
                gene_name: None,
                expression_level: None,
                structures: vec![],
            }
        );
    }

    #[test]
    fn test_only_first_list_entry_is_used() {
        let raw = json!({"msg": [{"id": 1, "gene": "MAPT"}, {"id": 2, "gene": "SNCA"}]});
        let rec = normalise(&raw).unwrap();
        assert_eq!(rec.experiment_id, Some(1u64.into()));
        assert_eq!(rec.gene_name.as_deref(), Some("MAPT"));
    }

    #[test]
    fn test_wrongly_typed_values_read_as_absent() {
        let raw = json!({"msg": {
            "id": true,
            "gene": 17,
            "expression_level": null,
            "structure_unionizes": [{"structure_id": [3], "expression_density": "high"}]
        }});
        let rec = normalise(&raw).unwrap();
        assert_eq!(rec.experiment_id, None);
        assert_eq!(rec.gene_name, None);
        assert_eq!(rec.expression_level, None);
        assert_eq!(rec.structures, vec![structure(None, None, None, None)]);
    }

    #[test]
    fn test_non_integer_ids_pass_through() {
        for id in [json!("abc"), json!(42.0), json!(-1)] {
            let raw = json!({"msg": [{
                "id": id,
                "structure_unionizes": [{"structure_id": id}]
            }]});
            let rec = normalise(&raw).unwrap();
            let expected: AtlasId = serde_json::from_value(id.clone()).unwrap();
            assert_eq!(rec.experiment_id.as_ref(), Some(&expected), "{id}");
            assert_eq!(rec.structures[0].structure_id.as_ref(), Some(&expected), "{id}");
        }

        let rec = normalise(&json!({"msg": {"id": 42.0, "structure_unionizes": [{"structure_id": 7.0}]}})).unwrap();
        assert_eq!(rec.experiment_id.map(|id| id.to_string()).as_deref(), Some("42.0"));
        assert_eq!(rec.structures[0].structure_id.as_ref().and_then(AtlasId::as_u64), None);
    }

    #[test]
    fn test_embedded_gene_object_uses_acronym() {
        let raw = json!({"msg": {"gene": {"id": 11, "acronym": "SNCA"}}});
        assert_eq!(normalise(&raw).unwrap().gene_name.as_deref(), Some("SNCA"));
    }

    #[test]
    fn test_structure_unionizes_not_an_array_yields_no_structures() {
        let raw = json!({"msg": {"id": 5, "structure_unionizes": {"structure_id": 1}}});
        assert!(normalise(&raw).unwrap().structures.is_empty());
    }

    #[test]
    fn test_normalise_is_idempotent() {
        let raw = json!({"msg": [{"id": 9, "structure_unionizes": [{"structure_id": 1, "volume": 2.0}]}]});
        assert_eq!(normalise(&raw), normalise(&raw));
    }
}
