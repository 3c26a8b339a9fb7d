//! brainmap-ranker — Structure ranking and expression figures.
//! Consumes persisted `ExpressionRecord`s: orders structures by density,
//! summarises them, and renders SVG charts.

pub mod rank;
pub mod figures;

pub use figures::FigureRenderer;
pub use rank::{mean_density, rank_by_density, top_by_density, ExpressionSummary, RankedStructure};
