mod rules;
mod validator;

use crate::error::ValidationError;
use crate::types::Bundle;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Bundle {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_bundle(self)
    }
}

/// Upstream checks that keep a run well-defined: every reference resolves and no
/// credential needs itself to be acquired.
pub fn validate_bundle(bundle: &Bundle) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_bundle(bundle);
    v.finish()
}
