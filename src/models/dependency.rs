use std::fmt;
use std::str::FromStr;

/// Represents a single requirement with its constraints, extras and markers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySpec {
    /// The package name as written
    pub name: String,

    /// Version constraints in `op` + `version` form (e.g. ">=1.0"); empty means any version
    pub version_specs: Vec<String>,

    /// Optional extras (e.g. ["security", "socks"])
    pub extras: Vec<String>,

    /// Direct reference URL (`name @ url` or a bare VCS/archive URL)
    pub url: Option<String>,

    /// Local path the requirement points at
    pub path: Option<String>,

    /// Whether the requirement was declared with `-e`/`--editable`
    pub editable: bool,

    /// Optional environment markers (e.g. "python_version > '3.7'")
    pub markers: Option<String>,
}

impl DependencySpec {
    /// Creates a new dependency that accepts any version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a version constraint to the dependency
    pub fn with_version(mut self, spec: impl Into<String>) -> Self {
        self.version_specs.push(spec.into());
        self
    }

    /// Adds extras to the dependency
    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = extras;
        self
    }

    /// Adds environment markers to the dependency
    pub fn with_markers(mut self, markers: impl Into<String>) -> Self {
        self.markers = Some(markers.into());
        self
    }

    /// The name used for every comparison between dependencies
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether the dependency needs a `file:` reference to be written into a manifest
    pub fn is_local(&self) -> bool {
        self.path.is_some()
    }

    /// Renders the dependency in PEP 508 form, the way it is written into `pyproject.toml`
    pub fn to_requirement_string(&self) -> String {
        let mut out = self.name.clone();

        if !self.extras.is_empty() {
            out.push('[');
            out.push_str(&self.extras.join(","));
            out.push(']');
        }

        let direct_reference = if let Some(url) = &self.url {
            Some(url.clone())
        } else {
            self.path.as_deref().map(path_to_file_url)
        };

        match &direct_reference {
            Some(reference) => {
                out.push_str(" @ ");
                out.push_str(reference);
            }
            None => out.push_str(&self.version_specs.join(",")),
        }

        if let Some(markers) = &self.markers {
            // A marker after a URL needs whitespace before the semicolon
            if direct_reference.is_some() {
                out.push_str(" ; ");
            } else {
                out.push_str("; ");
            }
            out.push_str(markers);
        }

        out
    }

    /// Compares the fields that carry meaning, ignoring name spelling and extras order
    pub fn is_equivalent(&self, other: &DependencySpec) -> bool {
        let extras = |spec: &DependencySpec| {
            let mut extras: Vec<String> = spec.extras.iter().map(|e| normalize_name(e)).collect();
            extras.sort();
            extras
        };

        self.normalized_name() == other.normalized_name()
            && self.version_specs == other.version_specs
            && extras(self) == extras(other)
            && self.url == other.url
            && self.path == other.path
            && self.markers == other.markers
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_requirement_string())
    }
}

/// Folds case and runs of `-`, `_` and `.` into a single `-` (PEP 503)
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_separator = false;

    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_was_separator {
                normalized.push('-');
            }
            last_was_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            last_was_separator = false;
        }
    }

    normalized
}

fn path_to_file_url(path: &str) -> String {
    if path.starts_with("file:") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:{}", path)
    }
}

/// Represents the input list a dependency came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyType {
    /// Main project dependency
    Main,

    /// Development dependency
    Dev,

    /// Test dependency
    Test,

    /// Documentation dependency
    Docs,

    /// Dependency in a custom named group
    Group(String),
}

impl FromStr for DependencyType {
    type Err = String;

    /// Converts a string representation to a DependencyType
    fn from_str(dep_type: &str) -> Result<Self, Self::Err> {
        let dep_type = dep_type.trim();
        if dep_type.is_empty() {
            return Err("Group name cannot be empty".to_string());
        }

        Ok(match dep_type.to_lowercase().as_str() {
            "main" => DependencyType::Main,
            "dev" => DependencyType::Dev,
            "test" => DependencyType::Test,
            "docs" => DependencyType::Docs,
            group => DependencyType::Group(group.to_string()),
        })
    }
}

impl DependencyType {
    /// Position of the group in output; custom groups keep their first-seen order after the known ones
    pub fn rank(&self) -> u8 {
        match self {
            DependencyType::Main => 0,
            DependencyType::Dev => 1,
            DependencyType::Test => 2,
            DependencyType::Docs => 3,
            DependencyType::Group(_) => 4,
        }
    }
}

/// A parsed dependency together with the input list it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedDependency {
    pub spec: DependencySpec,
    pub dep_type: DependencyType,
}

impl SourcedDependency {
    pub fn new(spec: DependencySpec, dep_type: DependencyType) -> Self {
        Self { spec, dep_type }
    }
}

/// A named collection of dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGroup {
    pub name: String,
    pub dependencies: Vec<DependencySpec>,
}

impl DependencyGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Appends a dependency, keeping any earlier entry with the same name
    pub fn push(&mut self, dep: DependencySpec) {
        self.dependencies.push(dep);
    }

    /// Adds a dependency, replacing an earlier entry with the same normalized name in place
    pub fn upsert(&mut self, dep: DependencySpec) {
        let name = dep.normalized_name();
        match self
            .dependencies
            .iter_mut()
            .find(|existing| existing.normalized_name() == name)
        {
            Some(existing) => *existing = dep,
            None => self.dependencies.push(dep),
        }
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
