pub mod analysis;
pub mod analyzer;
pub mod image;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod response;

pub use analysis::AnalysisService;
