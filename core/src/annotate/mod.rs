pub mod style;
pub mod cache;
pub mod pipeline;

pub use style::{DecorationStyle, HeatmapScale, StyleBuilder};
pub use cache::{Decoration, DecorationCache, LineRange};
pub use pipeline::{annotate, compute_annotations, AnnotationOutcome};
