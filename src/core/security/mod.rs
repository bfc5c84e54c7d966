// Security module for upload path validation
//
// Activity uploads read files from the local disk on behalf of the client.
// Only files under the configured upload directory may be read.

pub mod path_validator;

pub use path_validator::{PathSecurityError, UPLOAD_EXTENSIONS, upload_extension, validate_upload_path};
