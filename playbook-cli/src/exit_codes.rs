//! Process exit codes of the `playbook` binary, stable for CI scripts.

/// Every playbook finished, or `validate` found a consistent bundle.
pub const SUCCESS: i32 = 0;
/// Nothing was sent: the bundle, environment, inputs or selected target is unusable.
/// Matches what clap uses for usage errors.
pub const SETUP_FAILED: i32 = 2;
/// The run took place and at least one playbook aborted.
pub const PLAYBOOK_ABORTED: i32 = 3;
/// I/O or runtime trouble unrelated to bundle content.
pub const RUNTIME_ERROR: i32 = 4;
