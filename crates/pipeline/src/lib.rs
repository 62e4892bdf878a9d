pub mod builder;
pub mod error;
pub mod events;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod state;

pub use builder::AnalysisPipelineBuilder;
pub use error::PipelineError;
pub use events::PipelineEvent;
pub use history::HistoryService;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{AnalysisPipeline, InstanceReport, Upload};
pub use state::PipelineState;
