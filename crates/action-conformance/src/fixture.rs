//! Fixture configs and the test cases they pair with source documents.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::Value;
use tower_lsp::lsp_types::Position;
use walkdir::WalkDir;

/// One test case: a fixture config paired with the source document it
/// exercises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub config: PathBuf,
    pub source: PathBuf,
}

/// Parsed fixture config for a single test case.
///
/// Loaded once per case and never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseConfig {
    pub line: u32,
    pub character: u32,

    /// Source document under the fixture root's `source/` directory.
    /// Required when cases are discovered from a fixture root; explicit
    /// [`TestCase`] pairs may omit it.
    #[serde(default)]
    pub source: Option<String>,

    pub expected: Vec<ExpectedAction>,
}

impl CaseConfig {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path).map_err(|error| FixtureError::Unreadable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|error| FixtureError::Parse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }

    /// Cursor position the case queries at.
    pub fn cursor(&self) -> Position {
        Position::new(self.line, self.character)
    }
}

/// One expected code action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpectedAction {
    pub title: String,

    /// Exact ordered edit descriptors for the first changed document.
    #[serde(default)]
    pub edits: Option<Vec<Value>>,

    #[serde(default)]
    pub command: Option<ExpectedCommand>,
}

/// Expected command attached to a code action.
///
/// `arguments` is matched as a subset of the actual command's argument list;
/// extra actual arguments are permitted and ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpectedCommand {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// Pair every config under `<root>/config/` with its document under
/// `<root>/source/`, in file-name order.
pub fn discover_cases(root: &Path) -> Result<Vec<TestCase>, FixtureError> {
    let config_dir = root.join("config");
    let source_dir = root.join("source");
    let mut cases = Vec::new();
    for entry in WalkDir::new(&config_dir).sort_by_file_name() {
        let entry = entry.map_err(|error| FixtureError::Unreadable {
            path: config_dir.clone(),
            reason: error.to_string(),
        })?;
        if !entry.file_type().is_file() || entry.path().extension().is_none_or(|extension| extension != "json") {
            continue;
        }
        let config = entry.path().to_path_buf();
        let parsed = CaseConfig::load(&config)?;
        let Some(source) = parsed.source else {
            return Err(FixtureError::MissingSource { config });
        };
        let source = source_dir.join(source);
        if !source.is_file() {
            return Err(FixtureError::SourceNotFound { config, source });
        }
        cases.push(TestCase { config, source });
    }
    Ok(cases)
}

/// A fixture could not be loaded or paired with its source document.
#[derive(Debug)]
pub enum FixtureError {
    Unreadable {
        path: PathBuf,
        reason: String,
    },
    Parse {
        path: PathBuf,
        reason: String,
    },
    MissingSource {
        config: PathBuf,
    },
    SourceNotFound {
        config: PathBuf,
        source: PathBuf,
    },
}

impl Display for FixtureError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Unreadable {
                path,
                reason,
            } => {
                write!(f, "cannot read fixture {}: {reason}", path.display())
            },
            Self::Parse {
                path,
                reason,
            } => {
                write!(f, "fixture {} is not a valid case config: {reason}", path.display())
            },
            Self::MissingSource {
                config,
            } => {
                write!(f, "fixture {} names no source document", config.display())
            },
            Self::SourceNotFound {
                config,
                source,
            } => {
                write!(f, "fixture {} names a missing source document {}", config.display(), source.display())
            },
        }
    }
}

impl std::error::Error for FixtureError {}

#[cfg(test)]
#[path = "../tests/src/fixture_tests.rs"]
mod tests;
