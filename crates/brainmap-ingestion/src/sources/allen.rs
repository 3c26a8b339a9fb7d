//! Allen Brain Atlas REST client.
//!
//! Endpoints used (relative to `https://api.brain-map.org/api/v2/`):
//!   structure_graph_download/1.json           connectivity check
//!   data/Gene/query.json                      gene lookup by acronym
//!   data/SectionDataSet/query.json            experiments for a gene id
//!   data/SectionDataSet/<id>.json             one experiment, with structure unionizes
//!   data/Structure/<id>.json                  brain structure metadata

use std::sync::Arc;

use brainmap_common::{AtlasError, Result};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::AtlasTransport;
use crate::normalise::first_row;
use crate::normalise::gene::first_gene_id;

pub struct AllenClient {
    transport: Arc<dyn AtlasTransport>,
}

impl AllenClient {
    pub fn new(transport: Arc<dyn AtlasTransport>) -> Self {
        Self { transport }
    }

    /// Check the API answers at all.
    pub async fn test_connection(&self) -> Result<()> {
        self.transport
            .get_json("structure_graph_download/1.json")
            .await?;
        info!("Connected to Allen Brain Atlas API");
        Ok(())
    }

    /// Look up a gene by acronym. Returns `None` when the atlas has no match.
    #[instrument(skip(self))]
    pub async fn fetch_gene_info(&self, symbol: &str) -> Result<Option<Value>> {
        validate_symbol(symbol)?;

        let path = format!("data/Gene/query.json?criteria=[acronym$eq'{}']", symbol);
        let data = self.transport.get_json(&path).await?;

        if !has_rows(&data) {
            warn!("No data found for gene {}", symbol);
            return Ok(None);
        }

        info!("Fetched gene info for {}", symbol);
        Ok(Some(data))
    }

    /// Atlas id of the first gene in a [`fetch_gene_info`](Self::fetch_gene_info) response.
    pub fn gene_id(&self, gene_info: &Value) -> Option<u64> {
        first_gene_id(gene_info)
    }

    /// Fetch the first section data set recorded for a gene, with its
    /// per-structure expression. Returns `None` when the gene has no experiments.
    #[instrument(skip(self))]
    pub async fn fetch_expression_data(&self, gene_id: u64) -> Result<Option<Value>> {
        let path = format!("data/SectionDataSet/query.json?criteria=genes[id$eq{}]", gene_id);
        let data = self.transport.get_json(&path).await?;
        debug!(response = %truncate(&data), "SectionDataSet query response");

        let experiment_id = match first_row(&data) {
            Some(first) => first["id"].as_u64().ok_or_else(|| {
                AtlasError::NotFound(format!("experiment id for gene id {}", gene_id))
            })?,
            None => {
                warn!("No expression data found for gene id {}", gene_id);
                return Ok(None);
            }
        };
        info!(experiment_id, "Found experiment");

        let path = format!(
            "data/SectionDataSet/{}.json?include=structure_unionizes",
            experiment_id
        );
        let expression = self.transport.get_json(&path).await?;
        debug!(response = %truncate(&expression), "SectionDataSet detail response");

        Ok(Some(expression))
    }

    /// Fetch metadata for one brain structure.
    #[instrument(skip(self))]
    pub async fn fetch_structure_data(&self, structure_id: u64) -> Result<Value> {
        let path = format!("data/Structure/{}.json", structure_id);
        let data = self.transport.get_json(&path).await?;
        info!("Fetched structure data for id {}", structure_id);
        Ok(data)
    }
}

/// Symbols are spliced into RMA criteria strings, so only plain identifiers pass.
fn validate_symbol(symbol: &str) -> Result<()> {
    let ok = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(AtlasError::InvalidGeneSymbol(symbol.to_string()))
    }
}

fn has_rows(data: &Value) -> bool {
    first_row(data).is_some()
}

/// Response bodies can run to megabytes; keep debug lines readable.
fn truncate(data: &Value) -> String {
    const MAX: usize = 2_000;
    let mut s = data.to_string();
    if s.len() > MAX {
        let mut cut = MAX;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("…");
    }
    s
}
