pub mod company;
pub mod document;
pub mod loaders;
pub mod property;
pub mod work_item;

pub use company::{CompanyInfo, CompanySettings};
pub use document::{format_file_size, SelectedFile};
pub use loaders::{load_company, load_edits, load_selected_files, FieldEdit, ItemSelector};
pub use property::{join_features, split_features, PropertyData, PropertyField, FEATURE_DELIMITER};
pub use work_item::{GeneratedArtifact, OutputFormat, WorkItem};
