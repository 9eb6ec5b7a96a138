use super::dependency::DependencyType;
use super::project::ProjectMetadata;
use crate::utils::build_system::BuildBackend;
use std::path::PathBuf;
use std::str::FromStr;

/// How newly parsed dependencies are combined with a group already in the manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// The group becomes exactly the new list
    #[default]
    Replace,
    /// The new list is added after the existing entries
    Append,
}

/// Output format for the `show` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Names written into `[project.optional-dependencies]` for the built-in groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNames {
    pub dev: String,
    pub test: String,
    pub docs: String,
}

impl Default for GroupNames {
    fn default() -> Self {
        Self {
            dev: "dev".to_string(),
            test: "test".to_string(),
            docs: "docs".to_string(),
        }
    }
}

impl GroupNames {
    /// Checks that no built-in group is renamed onto the main dependency list
    pub fn check(&self) -> Result<(), String> {
        for (flag, name) in [("dev", &self.dev), ("test", &self.test), ("docs", &self.docs)] {
            check_group_name(name).map_err(|e| format!("Invalid {} group name: {}", flag, e))?;
        }
        Ok(())
    }

    /// Resolves the manifest group name for a dependency type
    pub fn resolve(&self, dep_type: &DependencyType) -> String {
        match dep_type {
            DependencyType::Main => MAIN_GROUP.to_string(),
            DependencyType::Dev => self.dev.clone(),
            DependencyType::Test => self.test.clone(),
            DependencyType::Docs => self.docs.clone(),
            DependencyType::Group(name) => name.clone(),
        }
    }
}

/// Group name that maps to `project.dependencies`
pub const MAIN_GROUP: &str = "main";

/// Validates a name used for an optional dependency group
pub fn check_group_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("group name is empty".to_string());
    }
    if name == MAIN_GROUP {
        return Err(format!("'{}' is reserved for project.dependencies", MAIN_GROUP));
    }
    Ok(())
}

/// Every behavioural switch of a conversion run
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Main requirements files
    pub requirements_files: Vec<PathBuf>,

    /// Development requirements files
    pub dev_requirements_files: Vec<PathBuf>,

    /// Test requirements files
    pub test_requirements_files: Vec<PathBuf>,

    /// Documentation requirements files
    pub docs_requirements_files: Vec<PathBuf>,

    /// Custom groups given as (group name, requirements file)
    pub custom_groups: Vec<(String, PathBuf)>,

    /// Manifest to create or update
    pub output_file: PathBuf,

    pub merge_mode: MergeMode,

    /// Copy an existing manifest to `<name>.backup` before overwriting it
    pub backup: bool,

    /// Accepted for compatibility; no resolution is performed
    pub resolve: bool,

    /// Sort every written group by normalized name
    pub sort: bool,

    pub build_backend: BuildBackend,

    pub group_names: GroupNames,

    /// Metadata for a manifest created from scratch
    pub metadata: ProjectMetadata,

    /// Merge records with the same normalized name inside a group
    pub dedupe: bool,

    /// Warn about malformed requirement lines instead of aborting
    pub skip_invalid: bool,

    /// Read files referenced with `-r`/`--requirement`
    pub follow_includes: bool,

    /// Move well-known dev/test/docs tools out of the main list
    pub auto_group: bool,

    /// Copy the dev group into `[tool.uv] dev-dependencies`
    pub uv_dev_dependencies: bool,

    /// Set `[tool.hatch.build.targets.wheel] packages` when it is missing
    pub hatch_wheel_packages: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            requirements_files: Vec::new(),
            dev_requirements_files: Vec::new(),
            test_requirements_files: Vec::new(),
            docs_requirements_files: Vec::new(),
            custom_groups: Vec::new(),
            output_file: PathBuf::from("pyproject.toml"),
            merge_mode: MergeMode::Replace,
            backup: true,
            resolve: false,
            sort: true,
            build_backend: BuildBackend::default(),
            group_names: GroupNames::default(),
            metadata: ProjectMetadata::default(),
            dedupe: false,
            skip_invalid: false,
            follow_includes: true,
            auto_group: false,
            uv_dev_dependencies: false,
            hatch_wheel_packages: false,
        }
    }
}

impl ConversionOptions {
    /// All requirements files paired with the list they feed, in command-line order per group
    pub fn input_files(&self) -> Vec<(PathBuf, DependencyType)> {
        let mut inputs = Vec::new();
        let tagged = [
            (&self.requirements_files, DependencyType::Main),
            (&self.dev_requirements_files, DependencyType::Dev),
            (&self.test_requirements_files, DependencyType::Test),
            (&self.docs_requirements_files, DependencyType::Docs),
        ];

        for (files, dep_type) in tagged {
            inputs.extend(files.iter().map(|f| (f.clone(), dep_type.clone())));
        }

        for (group, file) in &self.custom_groups {
            let dep_type = group
                .parse::<DependencyType>()
                .unwrap_or_else(|_| DependencyType::Group(group.clone()));
            inputs.push((file.clone(), dep_type));
        }

        inputs
    }
}
