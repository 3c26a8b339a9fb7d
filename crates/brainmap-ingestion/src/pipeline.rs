//! Sequential fetch → normalise → persist pipeline.
//!
//! Per gene:
//!   1. Gene lookup by acronym (persisted as `<gene>_info.json`)
//!   2. First section data set for the gene id
//!   3. `normalise` → `ExpressionRecord`
//!   4. Persist as `<gene>_expression.json`
//!
//! A failure at any step skips that gene only. Logging goes through the span
//! handed to [`ExpressionPipeline::new`].

use std::path::PathBuf;

use brainmap_common::{ExpressionRecord, Result};
use tracing::{info, warn, Instrument, Span};

use crate::normalise::{gene_infos, normalise};
use crate::repository::ExpressionStore;
use crate::sources::AllenClient;

/// What happened to one gene.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneOutcome {
    Saved {
        gene: String,
        path: PathBuf,
        record: ExpressionRecord,
    },
    Skipped {
        gene: String,
        reason: String,
    },
}

impl GeneOutcome {
    pub fn gene(&self) -> &str {
        match self {
            GeneOutcome::Saved { gene, .. } | GeneOutcome::Skipped { gene, .. } => gene,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub outcomes: Vec<GeneOutcome>,
}

impl PipelineReport {
    pub fn saved(&self) -> impl Iterator<Item = (&str, &ExpressionRecord)> + '_ {
        self.outcomes.iter().filter_map(|o| match o {
            GeneOutcome::Saved { gene, record, .. } => Some((gene.as_str(), record)),
            GeneOutcome::Skipped { .. } => None,
        })
    }

    pub fn n_saved(&self) -> usize {
        self.saved().count()
    }

    pub fn n_skipped(&self) -> usize {
        self.outcomes.len() - self.n_saved()
    }
}

pub struct ExpressionPipeline<S: ExpressionStore> {
    client: AllenClient,
    store: S,
    span: Span,
}

impl<S: ExpressionStore> ExpressionPipeline<S> {
    pub fn new(client: AllenClient, store: S, span: Span) -> Self {
        Self { client, store, span }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Run every gene in order. Fails only when the API is unreachable.
    pub async fn run(&self, genes: &[String]) -> Result<PipelineReport> {
        let span = self.span.clone();
        async move {
            if let Err(e) = self.client.test_connection().await {
                tracing::error!("Failed to connect to Allen Brain Atlas API: {}", e);
                return Err(e);
            }

            let mut report = PipelineReport::default();
            for gene in genes {
                info!(gene = %gene, "Fetching data");
                let outcome = match self.process_gene(gene).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(gene = %gene, error = %e, "Gene failed");
                        GeneOutcome::Skipped { gene: gene.clone(), reason: e.to_string() }
                    }
                };
                report.outcomes.push(outcome);
            }

            info!(
                n_saved = report.n_saved(),
                n_skipped = report.n_skipped(),
                "Pipeline complete"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn process_gene(&self, gene: &str) -> Result<GeneOutcome> {
        let skipped = |reason: &str| GeneOutcome::Skipped {
            gene: gene.to_string(),
            reason: reason.to_string(),
        };

        let Some(gene_doc) = self.client.fetch_gene_info(gene).await? else {
            return Ok(skipped("gene not found"));
        };
        let infos = gene_infos(&gene_doc);
        self.store.save_gene_info(gene, &infos)?;
        for g in &infos {
            info!(
                gene = %gene,
                name = g.name.as_deref().unwrap_or("?"),
                entrez_id = ?g.entrez_id,
                chromosome_id = ?g.chromosome_id,
                "Gene info"
            );
        }

        let Some(gene_id) = self.client.gene_id(&gene_doc) else {
            warn!(gene = %gene, "Gene lookup returned no id");
            return Ok(skipped("gene lookup returned no id"));
        };

        let Some(raw) = self.client.fetch_expression_data(gene_id).await? else {
            return Ok(skipped("no expression data"));
        };

        let record = match normalise(&raw) {
            Ok(record) => record,
            Err(no_data) => {
                warn!(gene = %gene, "Invalid expression data: {}", no_data);
                return Ok(skipped(&no_data.to_string()));
            }
        };

        let path = self.store.save_record(gene, &record)?;
        info!(
            gene = %gene,
            experiment_id = ?record.experiment_id,
            n_structures = record.structure_count(),
            "Expression record saved"
        );

        Ok(GeneOutcome::Saved { gene: gene.to_string(), path, record })
    }
}
