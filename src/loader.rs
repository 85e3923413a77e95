use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::TargetEnv;
use crate::envfile::{EnvParser, ParsedEnv, parse_env_file};
use crate::error::Error;
use crate::locate::{describe, locate};
use crate::model::{LoadReport, ParseMessage, ParseOptions, ResolvedEnvironment, WRAPPED_MARKER};

/// Parse the env file found from the current directory.
///
/// Looks for the default candidates (`.env`, `.env.json`, `.env.toml`,
/// `.env.yaml`) and fails with [`Error::NotFound`] when none exists.
pub fn create_env() -> Result<ResolvedEnvironment, Error> {
    EnvLoader::new().create_env()
}

/// Load the env file found from the current directory into the process
/// environment.
///
/// A missing file is not an error, and nothing is loaded when the process was
/// started by `runenv` (see [`WRAPPED_MARKER`]).
///
/// # Safety
///
/// This mutates the process environment. The caller must ensure no other
/// threads concurrently read or write it.
pub unsafe fn load_env() -> Result<LoadReport, Error> {
    let mut loader = EnvLoader::new().target(unsafe { TargetEnv::process() });
    loader.load()
}

/// Lint the env file found from the current directory.
pub fn lint_env() -> Result<Vec<ParseMessage>, Error> {
    EnvLoader::new().lint()
}

/// Builder-style env file loader.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    env_file: Option<PathBuf>,
    options: ParseOptions,
    search_parent: u32,
    force: bool,
    require_env_file: bool,
    current_dir: Option<PathBuf>,
    target: TargetEnv,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for this file instead of the default candidates.
    pub fn env_file(mut self, path: impl AsRef<Path>) -> Self {
        self.env_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = Some(prefix.into());
        self
    }

    pub fn strip_prefix(mut self, strip_prefix: bool) -> Self {
        self.options.strip_prefix = strip_prefix;
        self
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// How many parent directories to search after the starting one.
    pub fn search_parent(mut self, search_parent: u32) -> Self {
        self.search_parent = search_parent;
        self
    }

    /// Load even when the target already carries [`WRAPPED_MARKER`].
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Make [`EnvLoader::load`] fail when no env file is found.
    pub fn require_env_file(mut self, require_env_file: bool) -> Self {
        self.require_env_file = require_env_file;
        self
    }

    /// Start the search here instead of the process working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Where [`EnvLoader::load`] writes, and what placeholders fall back to.
    ///
    /// Defaults to an in-memory snapshot of the process environment.
    pub fn target(mut self, target: TargetEnv) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &TargetEnv {
        &self.target
    }

    pub fn into_target(self) -> TargetEnv {
        self.target
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.options
    }

    /// Find the env file this loader would read.
    pub fn find_env_file(&self) -> Result<Option<PathBuf>, Error> {
        let start = self.start_dir()?;
        Ok(locate(&start, self.search_parent, self.env_file.as_deref()))
    }

    /// Parse the env file without touching the target.
    pub fn create_env(&self) -> Result<ResolvedEnvironment, Error> {
        let path = self.require_path()?;
        parse_env_file(&path, &self.options, &self.target)
    }

    /// Parse the env file and keep the raw values and diagnostics as well.
    pub fn parse_only(&self) -> Result<ParsedEnv, Error> {
        let path = self.require_path()?;
        EnvParser::new(&self.options, &self.target).parse_file(&path)
    }

    /// Lint the env file.
    pub fn lint(&self) -> Result<Vec<ParseMessage>, Error> {
        self.parse_only().map(|parsed| parsed.messages)
    }

    /// Parse the env file and merge its variables into the target.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let start = self.start_dir()?;
        let Some(path) = locate(&start, self.search_parent, self.env_file.as_deref()) else {
            if self.require_env_file {
                return Err(self.not_found(start));
            }
            debug!(
                "no env file {} found, nothing to load",
                describe(self.env_file.as_deref())
            );
            return Ok(LoadReport::default());
        };

        if !self.force && self.target.contains_key(WRAPPED_MARKER) {
            debug!("{WRAPPED_MARKER} is set, skipping {}", path.display());
            return Ok(LoadReport {
                skipped_wrapped: true,
                file: Some(path),
                ..LoadReport::default()
            });
        }

        let resolved = parse_env_file(&path, &self.options, &self.target)?;
        let loaded = self.target.merge(&resolved);
        info!("env file {} loaded", path.display());

        Ok(LoadReport {
            loaded,
            skipped_wrapped: false,
            file: Some(path),
        })
    }

    fn require_path(&self) -> Result<PathBuf, Error> {
        let start = self.start_dir()?;
        locate(&start, self.search_parent, self.env_file.as_deref())
            .ok_or_else(|| self.not_found(start))
    }

    fn not_found(&self, start: PathBuf) -> Error {
        Error::NotFound {
            name: describe(self.env_file.as_deref()),
            start,
            search_parent: self.search_parent,
        }
    }

    fn start_dir(&self) -> Result<PathBuf, Error> {
        match &self.current_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|source| Error::io(".", source)),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            env_file: None,
            options: ParseOptions::default(),
            search_parent: 0,
            force: false,
            require_env_file: false,
            current_dir: None,
            target: TargetEnv::snapshot(),
        }
    }
}
