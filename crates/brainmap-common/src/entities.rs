/// Core entity types for Allen Brain Atlas expression data.
/// These are the canonical shapes written to `data/raw/*.json`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// An atlas identifier, kept exactly as the upstream sent it.
///
/// Ids are unsigned integers in practice. A float, negative or string id is
/// passed through as is, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AtlasId {
    Number(Number),
    Text(String),
}

impl AtlasId {
    /// The id as an unsigned integer, when it is one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AtlasId::Number(n) => n.as_u64(),
            AtlasId::Text(_) => None,
        }
    }
}

impl From<u64> for AtlasId {
    fn from(id: u64) -> Self {
        AtlasId::Number(id.into())
    }
}

impl From<&str> for AtlasId {
    fn from(id: &str) -> Self {
        AtlasId::Text(id.to_string())
    }
}

impl fmt::Display for AtlasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasId::Number(n) => write!(f, "{}", n),
            AtlasId::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Expression
// ---------------------------------------------------------------------------

/// Expression measured in one brain structure.
///
/// Every field is optional: the atlas omits measurements freely and an absent
/// value is kept absent rather than defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureExpression {
    pub structure_id: Option<AtlasId>,
    pub expression_density: Option<f64>,
    pub expression_energy: Option<f64>,
    pub volume: Option<f64>,
}

/// Canonical per-gene expression record.
///
/// `structures` keeps the order of the upstream `structure_unionizes` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub experiment_id: Option<AtlasId>,
    pub gene_name: Option<String>,
    pub expression_level: Option<f64>,
    pub structures: Vec<StructureExpression>,
}

impl ExpressionRecord {
    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Present densities, in input order.
    pub fn densities(&self) -> impl Iterator<Item = f64> + '_ {
        self.structures.iter().filter_map(|s| s.expression_density)
    }
}

// ---------------------------------------------------------------------------
// Gene
// ---------------------------------------------------------------------------

/// Gene summary as returned by the atlas `Gene` model query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneInfo {
    pub id: Option<u64>,
    pub acronym: Option<String>,
    pub gene_symbol: Option<String>,
    pub name: Option<String>,
    pub entrez_id: Option<u64>,
    pub chromosome_id: Option<u64>,
}
