use super::dependency::{DependencyGroup, DependencySpec};
use crate::parser::parse_requirement;
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Represents the parts of a pyproject.toml file this tool reads
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PyProject {
    pub project: Option<Project>,
    pub build_system: Option<BuildSystemConfig>,
}

/// Represents the [project] section
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Project {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub readme: Option<toml::Value>,
    pub requires_python: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub optional_dependencies: Option<BTreeMap<String, Vec<String>>>,
    pub dynamic: Option<Vec<String>>,
}

/// Represents the [build-system] section
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSystemConfig {
    #[serde(default)]
    pub requires: Vec<String>,
    pub build_backend: Option<String>,
}

/// Metadata used when a manifest has to be created from scratch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub requires_python: String,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            name: "project-name".to_string(),
            version: "0.1.0".to_string(),
            description: String::new(),
            requires_python: ">=3.8".to_string(),
        }
    }
}

/// Read model of a project manifest: identity fields plus parsed dependency groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub readme: Option<String>,
    pub requires_python: Option<String>,
    pub dependencies: Vec<DependencySpec>,
    pub optional_dependencies: Vec<DependencyGroup>,
    pub build_system: Option<BuildSystemConfig>,

    /// Dependency strings skipped because they could not be parsed
    pub invalid_entries: usize,
}

impl ProjectConfig {
    /// Builds the read model, skipping dependency strings that do not parse
    pub fn from_pyproject(pyproject: PyProject) -> Self {
        let mut config = ProjectConfig {
            build_system: pyproject.build_system,
            ..ProjectConfig::default()
        };

        let Some(project) = pyproject.project else {
            return config;
        };

        config.name = project.name;
        config.version = project.version;
        config.description = project.description;
        config.requires_python = project.requires_python;
        config.readme = project.readme.and_then(|readme| match readme {
            toml::Value::String(path) => Some(path),
            toml::Value::Table(table) => table
                .get("file")
                .and_then(|f| f.as_str())
                .map(str::to_string),
            _ => None,
        });

        let mut invalid = 0;
        config.dependencies = parse_entries(
            "main",
            project.dependencies.unwrap_or_default(),
            &mut invalid,
        );

        for (group_name, entries) in project.optional_dependencies.unwrap_or_default() {
            let dependencies = parse_entries(&group_name, entries, &mut invalid);
            config.optional_dependencies.push(DependencyGroup {
                name: group_name,
                dependencies,
            });
        }

        config.invalid_entries = invalid;
        config
    }

    /// Looks up an optional dependency group by name
    pub fn group(&self, name: &str) -> Option<&DependencyGroup> {
        self.optional_dependencies.iter().find(|g| g.name == name)
    }
}

fn parse_entries(group: &str, entries: Vec<String>, invalid: &mut usize) -> Vec<DependencySpec> {
    entries
        .into_iter()
        .filter_map(|entry| match parse_requirement(&entry) {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!("Skipping invalid dependency in {}: {} ({})", group, entry, e);
                *invalid += 1;
                None
            }
        })
        .collect()
}
