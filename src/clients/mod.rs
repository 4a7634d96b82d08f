pub mod backend;
pub mod conversion_client;

pub use backend::{ConversionBackend, ExtractedDocument, GeneratedPdf};
pub use conversion_client::ConversionClient;
