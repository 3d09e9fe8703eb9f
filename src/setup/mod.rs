pub mod pipeline;
pub mod report;
pub mod watch;

pub use pipeline::{run_pipeline, PipelineInputs, PipelineOptions};
pub use report::{render_summary, StepReport, StepStatus};
pub use watch::{find_latest_run, watch_run, PollPlan};
