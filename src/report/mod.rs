// src/report/mod.rs
pub mod blocks;
pub mod chart;
pub mod composer;

// Re-export key report types for convenience
#[allow(unused_imports)]
pub use blocks::{Alignment, DocumentBlock, Emphasis, ImageSource};
#[allow(unused_imports)]
pub use chart::{BarChart, ChartArtifact, ChartRenderer, SvgChartRenderer};
#[allow(unused_imports)]
pub use composer::{Metadata, ReportComposer};
