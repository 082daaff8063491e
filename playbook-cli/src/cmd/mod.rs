pub mod config;
pub mod operations;
pub mod render;
pub mod run;
pub mod try_request;
pub mod validate;
