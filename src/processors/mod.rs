pub mod normalizer;
pub mod pipeline;
pub mod quality_filter;
pub mod sampler;
pub mod unifier;

pub use normalizer::{NormalizedFile, Normalizer, ParseStats};
pub use pipeline::{DatasetSummary, PipelineRunner, PreparedData, RunSummary};
pub use quality_filter::{DropReason, FilterReport, QualityFilter};
pub use sampler::Sampler;
pub use unifier::{UnifyReport, Unifier};
