use std::fmt;
use std::io;
use std::path::PathBuf;

/// A dependency string in a manifest that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Group the string belongs to ("main" for `project.dependencies`)
    pub group: String,

    /// The dependency string as written in the manifest
    pub requirement: String,

    /// Why the string was rejected
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid dependency in {}: {} ({})",
            self.group, self.requirement, self.message
        )
    }
}

/// Custom error type for depcon operations
#[derive(Debug)]
pub enum Error {
    /// I/O errors (file access, permissions, etc.)
    Io(io::Error),

    /// TOML deserialization errors while reading the typed manifest model
    TomlSerde(toml::de::Error),

    /// A requirement line that does not follow the requirements grammar
    RequirementParse {
        path: PathBuf,
        line: usize,
        content: String,
        message: String,
    },

    /// A `-r` include chain that leads back to a file already being read
    IncludeCycle { path: PathBuf },

    /// An existing manifest that is not valid TOML or has an unexpected shape
    ManifestFormat { path: PathBuf, message: String },

    /// Errors related to file operations
    FileOperation { path: PathBuf, message: String },

    /// Dependency strings that failed validation, reported together
    Validation(Vec<ValidationIssue>),

    /// JSON/YAML rendering failures
    Serialization(String),

    /// General errors
    General(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::TomlSerde(err) => write!(f, "TOML deserialization error: {}", err),
            Error::RequirementParse {
                path,
                line,
                content,
                message,
            } => write!(
                f,
                "Failed to parse line {} in {}: {} ({})",
                line,
                path.display(),
                content,
                message
            ),
            Error::IncludeCycle { path } => {
                write!(f, "Requirements include cycle detected at {}", path.display())
            }
            Error::ManifestFormat { path, message } => {
                write!(f, "Malformed manifest {}: {}", path.display(), message)
            }
            Error::FileOperation { path, message } => {
                write!(f, "File operation error on {}: {}", path.display(), message)
            }
            Error::Validation(issues) => {
                write!(f, "{} invalid dependencies", issues.len())?;
                for issue in issues {
                    write!(f, "\n  - {}", issue)?;
                }
                Ok(())
            }
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::General(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error {
    /// Check if the error message contains a specific string
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Error::FileOperation { path: _, message } => message.contains(needle),
            _ => self.to_string().contains(needle),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::TomlSerde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::TomlSerde(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::General(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::General(err.to_string())
    }
}

/// Result type alias for depcon operations
pub type Result<T> = std::result::Result<T, Error>;
