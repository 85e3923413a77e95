//! Load environment variables from `.env`, JSON, YAML or TOML files.
//!
//! [`parse_env_file`] turns one file into a resolved map of variables:
//! lines are decoded, keys are filtered by an optional prefix, and `${NAME}`
//! placeholders are substituted from sibling values or the ambient
//! environment. [`lint_env_file`] returns the diagnostics collected on the
//! way instead, and [`locate`] finds the file by walking up parent
//! directories.
//!
//! [`EnvLoader`] wraps all three. Its default target is an in-memory snapshot
//! of the process environment; writing to the real process environment
//! requires the `unsafe` [`TargetEnv::process`] or [`load_env`], because
//! callers must guarantee no concurrent process-environment access.

mod diagnostics;
mod env;
mod envfile;
mod error;
mod filter;
mod format;
mod loader;
mod locate;
mod model;
mod parser;
mod resolver;
mod structured;

pub use diagnostics::Diagnostics;
pub use env::{EnvLookup, TargetEnv};
pub use envfile::{EnvParser, ParsedEnv, lint_env_file, parse_env_file, parse_env_str};
pub use error::Error;
pub use filter::filter_key;
pub use format::Format;
pub use loader::{EnvLoader, create_env, lint_env, load_env};
pub use locate::{DEFAULT_CANDIDATES, locate};
pub use model::{
    Level, LoadReport, ParseMessage, ParseOptions, RawEntry, RawEnvironment, ResolvedEnvironment,
    WRAPPED_MARKER,
};
pub use parser::{normalize_value, parse_line};
pub use resolver::{resolve, substitute};
