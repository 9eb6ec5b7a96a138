use log::debug;
use std::fmt;
use std::str::FromStr;
use toml_edit::{Array, DocumentMut, Formatted, Item, Table, Value};

/// Build backends that can be written into `[build-system]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildBackend {
    #[default]
    Hatchling,
    Setuptools,
    Poetry,
}

impl BuildBackend {
    /// Packages listed in `build-system.requires`
    pub fn requires(&self) -> &'static [&'static str] {
        match self {
            BuildBackend::Hatchling => &["hatchling"],
            BuildBackend::Setuptools => &["setuptools", "wheel"],
            BuildBackend::Poetry => &["poetry-core"],
        }
    }

    /// Value of `build-system.build-backend`
    pub fn backend_path(&self) -> &'static str {
        match self {
            BuildBackend::Hatchling => "hatchling.build",
            BuildBackend::Setuptools => "setuptools.build_meta",
            BuildBackend::Poetry => "poetry.core.masonry.api",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildBackend::Hatchling => "hatchling",
            BuildBackend::Setuptools => "setuptools",
            BuildBackend::Poetry => "poetry",
        }
    }
}

impl FromStr for BuildBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hatchling" | "hatch" => Ok(BuildBackend::Hatchling),
            "setuptools" => Ok(BuildBackend::Setuptools),
            "poetry" | "poetry-core" => Ok(BuildBackend::Poetry),
            other => Err(format!(
                "Unknown build backend '{}': expected hatchling, setuptools or poetry",
                other
            )),
        }
    }
}

impl fmt::Display for BuildBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates the `[build-system]` table for a backend
pub fn build_system_table(backend: BuildBackend) -> Table {
    let mut build_system = Table::new();

    let mut requires = Array::new();
    for package in backend.requires() {
        requires.push(Value::String(Formatted::new(package.to_string())));
    }
    build_system.insert("requires", Item::Value(Value::Array(requires)));

    build_system.insert(
        "build-backend",
        Item::Value(Value::String(Formatted::new(
            backend.backend_path().to_string(),
        ))),
    );

    build_system
}

/// Adds a `[build-system]` section for `backend` when the document has none.
///
/// An existing section is never replaced.
///
/// # Returns
///
/// * `bool` - Whether any changes were made to the document
pub fn update_build_system(doc: &mut DocumentMut, backend: BuildBackend) -> bool {
    if doc.contains_key("build-system") {
        debug!("Keeping existing build-system section");
        return false;
    }

    debug!("Adding build-system section for {}", backend);
    doc.insert("build-system", Item::Table(build_system_table(backend)));
    true
}
