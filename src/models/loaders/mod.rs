pub mod company_loader;
pub mod edits_loader;
pub mod file_loader;

pub use company_loader::load_company;
pub use edits_loader::{load_edits, parse_edits, FieldEdit, ItemSelector};
pub use file_loader::load_selected_files;
