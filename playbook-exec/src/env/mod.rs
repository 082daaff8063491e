mod dynamic;
mod seed;
mod stack;

pub use dynamic::{dynamic_entry, FUNCTIONS_ENTRY_ID};
pub use seed::{
    build_seed, environment_entry, inputs_entry, SeedError, DEFAULT_ENVIRONMENT, INPUTS_ENTRY_ID,
};
pub use stack::{EnvStack, EnvStackEntry};
