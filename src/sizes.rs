//! Sources of the pack sizes offered to customers.
//!
//! The service asks a `PackSizeSource` for the current candidate sizes on
//! every request that does not carry its own override. Sources hand out
//! sorted, deduplicated, strictly positive sizes; the solver still checks
//! them again.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

/// Failure while loading or listing pack sizes.
#[derive(Error, Debug)]
pub enum SizeSourceError {
    #[error("pack sizes file path not set")]
    PathNotSet,

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParsePackSizesError,
    },

    #[error("no valid pack sizes in {0}")]
    Empty(String),

    #[error("pack size {0} exceeds the supported range")]
    OutOfRange(u64),
}

/// Failure while parsing a textual list of pack sizes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsePackSizesError {
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("pack size must be > 0, got {0}")]
    NonPositive(i64),
}

/// Provides the current candidate pack sizes.
pub trait PackSizeSource: Send + Sync {
    /// Lists the sizes, ascending and without duplicates.
    fn list(&self) -> Result<Vec<u64>, SizeSourceError>;

    /// Short description for logs.
    fn name(&self) -> &str;
}

/// Parses sizes separated by commas, semicolons, whitespace or line breaks.
///
/// Values must be positive integers. Duplicates are dropped and the result is
/// sorted ascending.
///
/// # Examples
/// ```
/// use packwise::sizes::parse_pack_sizes;
///
/// let sizes = parse_pack_sizes("500,250;1000\n250 2000").unwrap();
/// assert_eq!(sizes, vec![250, 500, 1000, 2000]);
/// assert!(parse_pack_sizes("250,abc").is_err());
/// assert!(parse_pack_sizes("250,-1").is_err());
/// ```
pub fn parse_pack_sizes(text: &str) -> Result<Vec<u64>, ParsePackSizesError> {
    let mut sizes = text
        .split(|c: char| matches!(c, ',' | ';' | ' ' | '\n' | '\r' | '\t'))
        .filter(|token| !token.is_empty())
        .map(|token| {
            let value = token
                .parse::<i64>()
                .map_err(|_| ParsePackSizesError::InvalidNumber(token.to_owned()))?;
            u64::try_from(value)
                .ok()
                .filter(|&v| v > 0)
                .ok_or(ParsePackSizesError::NonPositive(value))
        })
        .collect::<Result<Vec<_>, _>>()?;
    sizes.sort_unstable();
    sizes.dedup();
    Ok(sizes)
}

/// Sizes read once from a file at startup.
#[derive(Clone, Debug)]
pub struct FileSizeSource {
    sizes: Vec<u64>,
}

impl FileSizeSource {
    /// Reads and parses the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SizeSourceError> {
        let raw = path.as_ref().to_string_lossy();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SizeSourceError::PathNotSet);
        }
        let path = PathBuf::from(trimmed);

        let text = std::fs::read_to_string(&path).map_err(|source| SizeSourceError::Io {
            path: path.clone(),
            source,
        })?;
        let sizes = parse_pack_sizes(&text).map_err(|source| SizeSourceError::Parse {
            path: path.clone(),
            source,
        })?;
        if sizes.is_empty() {
            return Err(SizeSourceError::Empty(path.display().to_string()));
        }

        info!(path = %path.display(), ?sizes, "loaded pack sizes from file");
        Ok(Self { sizes })
    }
}

impl PackSizeSource for FileSizeSource {
    fn list(&self) -> Result<Vec<u64>, SizeSourceError> {
        Ok(self.sizes.clone())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Fixed list of sizes, e.g. taken from an environment variable.
#[derive(Clone, Debug, Default)]
pub struct StaticSizeSource {
    sizes: Vec<u64>,
}

impl StaticSizeSource {
    /// Creates a source from arbitrary sizes; zeros are dropped, the rest is
    /// sorted and deduplicated.
    pub fn new(sizes: impl IntoIterator<Item = u64>) -> Self {
        let mut sizes: Vec<u64> = sizes.into_iter().filter(|&s| s > 0).collect();
        sizes.sort_unstable();
        sizes.dedup();
        Self { sizes }
    }
}

impl PackSizeSource for StaticSizeSource {
    fn list(&self) -> Result<Vec<u64>, SizeSourceError> {
        Ok(self.sizes.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Which size source the service uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SizeSourceConfig {
    /// Read sizes from a file.
    File(PathBuf),
    /// Use a fixed list.
    Static(Vec<u64>),
}

impl fmt::Display for SizeSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSourceConfig::File(path) => write!(f, "file ({})", path.display()),
            SizeSourceConfig::Static(sizes) => write!(f, "static ({sizes:?})"),
        }
    }
}

/// Builds the configured size source.
pub fn build_size_source(
    config: &SizeSourceConfig,
) -> Result<Arc<dyn PackSizeSource>, SizeSourceError> {
    match config {
        SizeSourceConfig::File(path) => Ok(Arc::new(FileSizeSource::from_path(path)?)),
        SizeSourceConfig::Static(sizes) => {
            let source = StaticSizeSource::new(sizes.iter().copied());
            if source.sizes.is_empty() {
                return Err(SizeSourceError::Empty("static pack size list".to_string()));
            }
            Ok(Arc::new(source))
        }
    }
}
