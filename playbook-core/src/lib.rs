#![forbid(unsafe_code)]

pub mod error;
pub mod parser;
pub mod template;
pub mod types;
pub mod validate;

pub use crate::error::{BundleError, ParseError, ValidationError, Violation};
pub use crate::parser::{parse_bundle_str, BundleFormat, ParsedBundle};
pub use crate::types::Bundle;
pub use crate::validate::{validate_bundle, Validate};

/// Parses and validates a bundle document in one go.
pub fn load_bundle_str(input: &str, format: BundleFormat) -> Result<ParsedBundle, BundleError> {
    let parsed = parse_bundle_str(input, format)?;
    validate_bundle(&parsed.bundle)?;
    Ok(parsed)
}
