// crates/citysearch-core/src/config.rs
use crate::error::{CityError, Result};
use crate::index::MIN_QUERY_CHARS;
use crate::parse::DEFAULT_DELIMITER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for overrides (`CITYSEARCH_DATASET`, ...).
pub const ENV_PREFIX: &str = "CITYSEARCH_";

/// Configuration for the lookup service.
///
/// Sources, lowest to highest priority:
/// 1. Built-in defaults
/// 2. A TOML file ([`LookupConfig::from_file`])
/// 3. Environment variables with the `CITYSEARCH_` prefix
/// 4. CLI flags (applied by the binary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Path or http(s) URL of the full-tier dataset.
    ///
    /// Default: `data/us_cities.csv` inside the core crate.
    pub dataset: String,

    /// Quiet interval before a submitted query runs.
    pub debounce_ms: u64,

    /// Upper bound on fetching the full tier; a timeout counts as a failure.
    pub load_timeout_ms: u64,

    /// Maximum results per query.
    pub result_limit: usize,

    /// Inputs shorter than this produce an empty result. At least
    /// [`MIN_QUERY_CHARS`], the floor `CityIndex` enforces on its own.
    pub min_query_chars: usize,

    /// Field delimiter of the dataset.
    pub delimiter: char,
}

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_RESULT_LIMIT: usize = 10;

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset().to_string_lossy().into_owned(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            result_limit: DEFAULT_RESULT_LIMIT,
            min_query_chars: MIN_QUERY_CHARS,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl LookupConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CityError::NotFound(format!("config file {}: {}", path.display(), e))
            } else {
                CityError::Io(e)
            }
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `CITYSEARCH_*` overrides read through `lookup`.
    ///
    /// Taking the lookup as a closure keeps tests off the real environment.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("DATASET") {
            self.dataset = v;
        }
        if let Some(v) = var("DEBOUNCE_MS") {
            self.debounce_ms = parse_env("DEBOUNCE_MS", &v)?;
        }
        if let Some(v) = var("LOAD_TIMEOUT_MS") {
            self.load_timeout_ms = parse_env("LOAD_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("RESULT_LIMIT") {
            self.result_limit = parse_env("RESULT_LIMIT", &v)?;
        }
        if let Some(v) = var("MIN_QUERY_CHARS") {
            self.min_query_chars = parse_env("MIN_QUERY_CHARS", &v)?;
        }
        if let Some(v) = var("DELIMITER") {
            self.delimiter = parse_env("DELIMITER", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(CityError::Config("dataset must not be empty".into()));
        }
        if self.load_timeout_ms == 0 {
            return Err(CityError::Config("load_timeout_ms must be positive".into()));
        }
        if self.result_limit == 0 {
            return Err(CityError::Config("result_limit must be positive".into()));
        }
        if self.min_query_chars < MIN_QUERY_CHARS {
            return Err(CityError::Config(format!(
                "min_query_chars must be at least {MIN_QUERY_CHARS}"
            )));
        }
        if self.delimiter == '"' {
            return Err(CityError::Config("delimiter cannot be the quote character".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

/// Default location of the full-tier dataset.
pub fn default_dataset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("us_cities.csv")
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CityError::Config(format!("{ENV_PREFIX}{name}: cannot parse {value:?}")))
}

/// Example config file content, printed by `citysearch config`.
pub fn example_config() -> &'static str {
    r#"# citysearch configuration
#
# Priority: CLI flags > CITYSEARCH_* environment variables > this file > defaults

# Full-tier dataset: a file path or an http(s) URL. `.gz` payloads are unpacked.
#dataset = "/srv/data/us_cities.csv.gz"

# Milliseconds of quiet before an interactive query runs
debounce_ms = 300

# Give up on the full-tier fetch after this many milliseconds
load_timeout_ms = 15000

# Maximum results per query
result_limit = 10

# Shorter inputs return nothing
min_query_chars = 2

# Field delimiter of the dataset
delimiter = ","
"#
}
