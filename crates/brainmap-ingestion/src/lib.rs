//! brainmap-ingestion — Allen Brain Atlas expression ingestion.
//! - Atlas REST access (gene lookup, section data sets, structures)
//! - Normalisation of raw responses into `ExpressionRecord`s
//! - JSON persistence keyed by gene symbol
//! - The sequential fetch → normalise → persist pipeline

pub mod sources;
pub mod normalise;
pub mod repository;
pub mod pipeline;
