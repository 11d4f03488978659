// src/grades/mod.rs
pub mod collector;
pub mod model;

// Re-export key grading types for convenience
#[allow(unused_imports)]
pub use model::{
    format_score,
    GradesFile,
    GradesReport,
    RubricPart,
    RubricTemplate,
    ScoreRange,
};
#[allow(unused_imports)]
pub use collector::{collect_interactive, CollectorState, GradeCollector};
