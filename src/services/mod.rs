pub mod artifact_writer;
pub mod failure_writer;
pub mod file_validator;

pub use artifact_writer::ArtifactWriter;
pub use failure_writer::FailureWriter;
pub use file_validator::{FileConstraints, FileValidator};
