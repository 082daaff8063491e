use std::collections::BTreeMap;

use serde_json::{json, Value as JsonValue};

use crate::env::EnvStackEntry;

pub const FUNCTIONS_ENTRY_ID: &str = "functions";

const RANDOM_STRING_LEN: usize = 20;

/// Built-in `$` variables. Values are computed once, when the seed is built, so every
/// stage of a run sees the same `$uuid` or `$timestamp`.
pub fn dynamic_entry() -> EnvStackEntry {
    let now = chrono::Utc::now();
    let random_string: String = std::iter::repeat_with(fastrand::alphanumeric)
        .take(RANDOM_STRING_LEN)
        .collect();

    let env: BTreeMap<String, JsonValue> = [
        ("$uuid", json!(uuid::Uuid::new_v4().to_string())),
        ("$timestamp", json!(now.timestamp())),
        (
            "$timestamp3339",
            json!(now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        ),
        ("$randomint", json!(fastrand::i32(..))),
        ("$randomuint", json!(fastrand::u32(..))),
        ("$randomString", json!(random_string)),
        ("$random", json!(fastrand::u64(..).to_string())),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    EnvStackEntry::new(FUNCTIONS_ENTRY_ID, env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provides_all_builtins() {
        let entry = dynamic_entry();
        for name in [
            "$uuid",
            "$timestamp",
            "$timestamp3339",
            "$randomint",
            "$randomuint",
            "$randomString",
            "$random",
        ] {
            assert!(entry.env.contains_key(name), "missing {name}");
        }
        assert_eq!(
            entry.env["$randomString"].as_str().map(str::len),
            Some(RANDOM_STRING_LEN)
        );
        assert!(entry.env["$timestamp"].is_i64());
    }
}
