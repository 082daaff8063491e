use crate::template::is_valid_name;
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_ids<'a>(v: &mut Validator, path: &str, keys: impl Iterator<Item = &'a String>) {
    for key in keys {
        if !ID_RE.is_match(key) {
            v.push(
                format!("{path}.{key}"),
                "identifier must match regex ^[A-Za-z0-9_\\.\\-]+$",
            );
        }
    }
}

pub(crate) fn validate_variable_name(v: &mut Validator, path: &str, name: &str) {
    if !is_valid_name(name) {
        v.push(path, format!("invalid variable name '{name}'"));
    }
}
