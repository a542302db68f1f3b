pub mod upload;

pub use upload::{UploadFileCommand, UploadFileError};
