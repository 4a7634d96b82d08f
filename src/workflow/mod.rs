pub mod controller;
pub mod progress;
pub mod state;

pub use controller::BatchController;
pub use progress::{ItemFailure, PhaseReport, ProgressEvent, ProgressStatus, Stage};
pub use state::{Phase, WorkflowState};
