//! Configuration management
//!
//! Environment variable loading with typed parsing and defaults.

mod env;

pub use env::{get_env, get_env_bool, get_env_or, get_env_parse, get_env_parse_or};
