//! SVG figures for expression records.
//!
//! - `<gene>_expression_density.svg`: horizontal bars, top-N structures by density
//! - `<g1>_<g2>_..._expression_comparison.svg`: density against structure rank, one line per gene

use std::path::{Path, PathBuf};

use brainmap_common::{AtlasError, ExpressionRecord, Result};
use brainmap_ingestion::repository::ExpressionStore;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::rank::{top_by_density, RankedStructure};

/// Default location for rendered figures.
pub const DEFAULT_RESULTS_DIR: &str = "results/figures";

/// Structures shown per gene unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 20;

const SERIES_COLORS: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

#[derive(Debug, Clone)]
pub struct FigureRenderer {
    results_dir: PathBuf,
    top_n: usize,
}

impl FigureRenderer {
    /// Create the renderer and its output directory.
    pub fn new(results_dir: impl Into<PathBuf>, top_n: usize) -> Result<Self> {
        let results_dir = results_dir.into();
        std::fs::create_dir_all(&results_dir)?;
        Ok(Self { results_dir, top_n: top_n.max(1) })
    }

    pub fn density_path(&self, gene: &str) -> PathBuf {
        self.results_dir.join(format!("{}_expression_density.svg", gene))
    }

    pub fn comparison_path(&self, genes: &[&str]) -> PathBuf {
        self.results_dir.join(format!("{}_expression_comparison.svg", genes.join("_")))
    }

    /// Bar chart of one gene's highest-density structures.
    pub fn plot_expression_density(&self, gene: &str, record: &ExpressionRecord) -> Result<PathBuf> {
        let top = top_by_density(record, self.top_n);
        if top.is_empty() {
            return Err(AtlasError::NotFound(format!("expression densities for {}", gene)));
        }

        let path = self.density_path(gene);
        draw_density(&path, gene, &top)?;
        info!(gene = %gene, path = %path.display(), "Density figure written");
        Ok(path)
    }

    /// Overlaid rank/density lines, one per gene. Genes without densities are
    /// left out of both the chart and the file name; it is an error only when
    /// none remain.
    pub fn plot_expression_comparison(&self, records: &[(&str, &ExpressionRecord)]) -> Result<PathBuf> {
        let series: Vec<(&str, Vec<f64>)> = records
            .iter()
            .filter_map(|(gene, record)| {
                let densities: Vec<f64> = top_by_density(record, self.top_n)
                    .into_iter()
                    .map(|s| s.expression_density)
                    .collect();
                if densities.is_empty() {
                    warn!(gene = %gene, "No densities to compare, leaving gene out");
                    None
                } else {
                    Some((*gene, densities))
                }
            })
            .collect();

        if series.is_empty() {
            return Err(AtlasError::NotFound("expression densities for comparison".to_string()));
        }

        let genes: Vec<&str> = series.iter().map(|(gene, _)| *gene).collect();
        let path = self.comparison_path(&genes);
        draw_comparison(&path, &series)?;
        info!(path = %path.display(), n_genes = series.len(), "Comparison figure written");
        Ok(path)
    }

    /// Density figure for a gene already persisted in `store`.
    pub fn plot_stored_density<S: ExpressionStore>(&self, store: &S, gene: &str) -> Result<PathBuf> {
        let record = store
            .load_record(gene)?
            .ok_or_else(|| AtlasError::NotFound(format!("stored expression record for {}", gene)))?;
        self.plot_expression_density(gene, &record)
    }

    /// Comparison figure over the persisted genes; genes with no stored record are left out.
    pub fn plot_stored_comparison<S: ExpressionStore>(&self, store: &S, genes: &[String]) -> Result<PathBuf> {
        let mut loaded: Vec<(&str, ExpressionRecord)> = Vec::with_capacity(genes.len());
        for gene in genes {
            match store.load_record(gene)? {
                Some(record) => loaded.push((gene.as_str(), record)),
                None => warn!(gene = %gene, "No stored record, leaving gene out of comparison"),
            }
        }
        let refs: Vec<(&str, &ExpressionRecord)> = loaded.iter().map(|(g, r)| (*g, r)).collect();
        self.plot_expression_comparison(&refs)
    }
}

/// Horizontal bars, highest density at the top.
fn draw_density(path: &Path, gene: &str, top: &[RankedStructure]) -> Result<()> {
    let n = top.len() as u32;
    let x_max = axis_max(top[0].expression_density);
    // Row 0 is the bottom of the chart, so the highest density goes last.
    let labels: Vec<String> = top
        .iter()
        .rev()
        .map(|s| s.structure_id.as_ref().map_or_else(|| "?".to_string(), ToString::to_string))
        .collect();

    let root = SVGBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Expression Density of {} Across Brain Structures", gene),
            ("sans-serif", 24),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..x_max, (0u32..n).into_segmented())
        .map_err(plot_error)?;

    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(top.len())
        .y_label_formatter(&label_of)
        .x_desc("Expression Density")
        .y_desc("Structure ID")
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(top.iter().enumerate().map(|(rank, s)| {
            let row = n - 1 - rank as u32;
            Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (s.expression_density, SegmentValue::Exact(row + 1)),
                ],
                BLUE.mix(0.7).filled(),
            )
        }))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// One line per gene: density against structure rank.
fn draw_comparison(path: &Path, series: &[(&str, Vec<f64>)]) -> Result<()> {
    let longest = series.iter().map(|(_, d)| d.len()).max().unwrap_or(1);
    let x_max = (longest.saturating_sub(1)).max(1) as f64;
    let y_max = axis_max(series.iter().map(|(_, d)| d[0]).fold(0.0, f64::max));

    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Expression Density Comparison Across Genes", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Structure Rank")
        .y_desc("Expression Density")
        .draw()
        .map_err(plot_error)?;

    for (idx, (gene, densities)) in series.iter().enumerate() {
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                densities.iter().enumerate().map(|(rank, d)| (rank as f64, *d)),
                color.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(*gene)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Upper axis bound with a little headroom; all-zero data still gets a usable axis.
fn axis_max(max_value: f64) -> f64 {
    if max_value > 0.0 {
        max_value * 1.05
    } else {
        1.0
    }
}

fn plot_error<E: std::fmt::Display>(e: E) -> AtlasError {
    AtlasError::Plot(e.to_string())
}
