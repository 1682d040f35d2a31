//! Run configuration.
//!
//! Pagebreak works without any configuration. A `pagebreak.toml` in the
//! working directory, or a file named with `--config`, changes the defaults
//! that documents fall back to when their container does not say otherwise.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [pagination]
//! per_page = 2                        # Items per page for a bare data-pagebreak
//! url_format = "./page/:num/"         # Where page 2 and later are written
//! meta_format = ":content | Page :num" # Title of page 2 and later
//!
//! [parsing]
//! strict = true                       # Leave documents with parse errors alone
//!
//! [processing]
//! max_processes = 4                   # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Attributes on the container always win over these values. Unknown keys are
//! rejected to catch typos early.

use crate::engine::EngineOptions;
use crate::paginate::PaginationDefaults;
use crate::urls::NUM_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "pagebreak.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `pagebreak.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagebreakConfig {
    /// Fallbacks for containers that leave attributes out.
    pub pagination: PaginationConfig,
    pub parsing: ParsingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PagebreakConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.per_page == 0 {
            return Err(ConfigError::Validation(
                "pagination.per_page must be at least 1".into(),
            ));
        }
        if !self.pagination.url_format.contains(NUM_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "pagination.url_format must contain {NUM_PLACEHOLDER}"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Engine settings implied by this config.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict: self.parsing.strict,
            pagination: PaginationDefaults {
                per_page: self.pagination.per_page,
                url_format: self.pagination.url_format.clone(),
                meta_format: self.pagination.meta_format.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub per_page: usize,
    /// Output location of page 2 onwards, relative to the document's directory.
    pub url_format: String,
    /// Title format of page 2 onwards. `:content` is the original title.
    pub meta_format: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        let defaults = PaginationDefaults::default();
        Self {
            per_page: defaults.per_page,
            url_format: defaults.url_format,
            meta_format: defaults.meta_format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParsingConfig {
    /// When set, a document that does not parse cleanly is copied unchanged
    /// instead of being paginated from the parser's recovered tree.
    pub strict: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl ProcessingConfig {
    /// Workers to run on a machine with `cores` cores. A configured limit
    /// can only lower the count.
    pub fn worker_threads(&self, cores: usize) -> usize {
        match self.max_processes {
            Some(limit) => limit.clamp(1, cores.max(1)),
            None => cores.max(1),
        }
    }
}

/// Load and validate the run configuration.
///
/// An `explicit` path must exist. Without one, `pagebreak.toml` in `dir` is
/// used when present and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<PagebreakConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = dir.join(CONFIG_FILENAME);
            if !candidate.is_file() {
                return Ok(PagebreakConfig::default());
            }
            candidate
        }
    };
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config: PagebreakConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `pagebreak.toml` with all keys and explanations.
///
/// Used by the `--gen-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# Pagebreak Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pagebreak reads ./pagebreak.toml, or the file passed with --config.
# Attributes on a pagination container always override these values.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Pagination
# ---------------------------------------------------------------------------
[pagination]
# Items per page when a container has an empty data-pagebreak attribute.
per_page = 2

# Where page 2 and later are written, relative to the document's directory.
# :num is replaced with the page number. Start with / to place pages
# relative to the output root instead.
url_format = "./page/:num/"

# Title of page 2 and later. :content is the original title and :num the
# page number. Also applied to og:title and twitter:title.
meta_format = ":content | Page :num"

# ---------------------------------------------------------------------------
# Parsing
# ---------------------------------------------------------------------------
[parsing]
# Copy documents with HTML parse errors unchanged (with a warning) instead
# of paginating the parser's best-effort reading of them.
# --lenient turns this off for a single run.
strict = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# --jobs overrides this for a single run.
# max_processes = 4
"##
}
