mod json_pointer;
mod tokens;

pub use json_pointer::{JsonPointer, JsonPointerError};
pub use tokens::{is_valid_name, parse_template, value_tokens, Segment, Template};
