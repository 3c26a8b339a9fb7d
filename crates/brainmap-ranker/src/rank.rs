//! Density ranking of brain structures.
//!
//! Structures without a density take no part in ranking or averaging. A
//! density of exactly zero is a measurement and does take part.

use brainmap_common::{AtlasId, ExpressionRecord};
use serde::Serialize;

/// A structure with a present density, in ranked position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStructure {
    pub structure_id: Option<AtlasId>,
    pub expression_density: f64,
}

/// Structures sorted by density, highest first. Ties keep input order.
pub fn rank_by_density(record: &ExpressionRecord) -> Vec<RankedStructure> {
    let mut ranked: Vec<RankedStructure> = record
        .structures
        .iter()
        .filter_map(|s| {
            s.expression_density.map(|d| RankedStructure {
                structure_id: s.structure_id.clone(),
                expression_density: d,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.expression_density.total_cmp(&a.expression_density));
    ranked
}

/// The `n` highest-density structures.
pub fn top_by_density(record: &ExpressionRecord, n: usize) -> Vec<RankedStructure> {
    let mut ranked = rank_by_density(record);
    ranked.truncate(n);
    ranked
}

/// Mean over present densities; `None` if there are none.
pub fn mean_density(record: &ExpressionRecord) -> Option<f64> {
    let (sum, count) = record
        .densities()
        .fold((0.0f64, 0usize), |(sum, count), d| (sum + d, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Per-gene figures reported after a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionSummary {
    pub gene: String,
    pub n_structures: usize,
    pub n_with_density: usize,
    pub mean_density: Option<f64>,
}

impl ExpressionSummary {
    pub fn from_record(gene: &str, record: &ExpressionRecord) -> Self {
        Self {
            gene: gene.to_string(),
            n_structures: record.structure_count(),
            n_with_density: record.densities().count(),
            mean_density: mean_density(record),
        }
    }
}

impl std::fmt::Display for ExpressionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} brain structures with expression data",
            self.gene, self.n_structures
        )?;
        if let Some(mean) = self.mean_density {
            write!(f, ", average expression density {:.4}", mean)?;
        }
        Ok(())
    }
}
