//! Loading, merging and writing of `pyproject.toml` manifests.
//!
//! Edits go through `toml_edit`, so every part of an existing manifest that is not a
//! dependency list being written is re-emitted exactly as it was read.

pub mod show;
pub mod validate;

use crate::error::{Error, Result};
use crate::models::{
    DependencySpec, MAIN_GROUP, MergeMode, ProjectConfig, ProjectMetadata, PyProject,
};
use crate::parser::requirement_sort_key;
use crate::utils::build_system::{BuildBackend, update_build_system};
use crate::utils::file_ops::{create_backup, write_atomic};
use crate::utils::toml::{dependency_array, order_project_fields, read_toml};
use log::{debug, info};
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, Table, TableLike, Value};

/// A project manifest held as an editable TOML document
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    doc: DocumentMut,
    created: bool,
}

impl Manifest {
    /// Opens an existing manifest, failing if it is unreadable or malformed
    pub fn open(path: &Path) -> Result<Self> {
        let doc = read_toml(path)?;
        check_shape(path, &doc.to_string())?;

        debug!("Loaded manifest {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            created: false,
        })
    }

    /// Synthesizes a new manifest with a `[build-system]` section followed by `[project]`
    pub fn create(path: &Path, metadata: &ProjectMetadata, backend: BuildBackend) -> Self {
        let mut doc = DocumentMut::new();
        update_build_system(&mut doc, backend);
        doc.insert("project", Item::Table(project_table(metadata)));

        debug!("Created new manifest for {}", path.display());
        Self {
            path: path.to_path_buf(),
            doc,
            created: true,
        }
    }

    /// Opens the manifest at `path`, or creates a new one when no file exists there
    pub fn load_or_create(
        path: &Path,
        metadata: &ProjectMetadata,
        backend: BuildBackend,
    ) -> Result<Self> {
        if path.exists() {
            Self::open(path)
        } else {
            info!("No manifest at {}, creating a new one", path.display());
            Ok(Self::create(path, metadata, backend))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the manifest was synthesized rather than read from disk
    pub fn is_new(&self) -> bool {
        self.created
    }

    pub fn document(&self) -> &DocumentMut {
        &self.doc
    }

    /// Parses the manifest into its read model, optional groups in document order
    pub fn project_config(&self) -> Result<ProjectConfig> {
        let pyproject: PyProject = toml::from_str(&self.doc.to_string())?;
        let mut config = ProjectConfig::from_pyproject(pyproject);

        let order: Vec<String> = self.raw_groups().into_iter().map(|(name, _)| name).collect();
        config.optional_dependencies.sort_by_key(|group| {
            order
                .iter()
                .position(|name| *name == group.name)
                .unwrap_or(usize::MAX)
        });
        Ok(config)
    }

    /// Dependency strings exactly as written, main group first, then optional groups in
    /// document order
    pub fn raw_groups(&self) -> Vec<(String, Vec<String>)> {
        let mut groups = Vec::new();
        let Some(project) = self.doc.get("project").and_then(Item::as_table_like) else {
            return groups;
        };

        if let Some(array) = project.get("dependencies").and_then(Item::as_array) {
            groups.push((MAIN_GROUP.to_string(), string_entries(array)));
        }

        if let Some(optional) = project
            .get("optional-dependencies")
            .and_then(Item::as_table_like)
        {
            for (name, item) in optional.iter() {
                if let Some(array) = item.as_array() {
                    groups.push((name.to_string(), string_entries(array)));
                }
            }
        }

        groups
    }

    /// Adds `[project]` name and version to an existing manifest that lacks them
    pub fn fill_missing_metadata(&mut self, metadata: &ProjectMetadata) -> Result<()> {
        if !self.doc.contains_key("project") {
            info!("Adding [project] section to {}", self.path.display());
            self.doc
                .insert("project", Item::Table(project_table(metadata)));
            return Ok(());
        }

        let project = self.project_mut()?;
        let dynamic: Vec<String> = project
            .get("dynamic")
            .and_then(Item::as_array)
            .map(string_entries)
            .unwrap_or_default();

        if !project.contains_key("name") {
            project.insert("name", Item::Value(Value::from(metadata.name.as_str())));
        }
        if !project.contains_key("version") && !dynamic.iter().any(|d| d == "version") {
            project.insert(
                "version",
                Item::Value(Value::from(metadata.version.as_str())),
            );
        }

        Ok(())
    }

    /// Adds a `[build-system]` section for `backend` when the manifest has none
    pub fn ensure_build_system(&mut self, backend: BuildBackend) -> bool {
        update_build_system(&mut self.doc, backend)
    }

    /// Writes a dependency group into the manifest.
    ///
    /// `main` maps to `project.dependencies`; every other name to
    /// `project.optional-dependencies.<name>`. In replace mode the group becomes exactly
    /// `specs`; in append mode existing entries are kept verbatim ahead of them. With
    /// `sort` the final list is ordered by normalized name, keeping ties in place.
    pub fn apply_group(
        &mut self,
        group: &str,
        specs: &[DependencySpec],
        mode: MergeMode,
        sort: bool,
    ) -> Result<()> {
        let path = self.path.clone();
        let project = self.project_mut()?;

        let mut entries: Vec<Value> = Vec::new();
        if mode == MergeMode::Append {
            let existing = if group == MAIN_GROUP {
                project.get("dependencies")
            } else {
                project
                    .get("optional-dependencies")
                    .and_then(Item::as_table_like)
                    .and_then(|optional| optional.get(group))
            };
            if let Some(array) = existing.and_then(Item::as_array) {
                debug!("Keeping {} existing entries in {}", array.len(), group);
                entries.extend(array.iter().cloned());
            }
        }

        entries.extend(
            specs
                .iter()
                .map(|spec| Value::from(spec.to_requirement_string())),
        );

        if sort {
            entries.sort_by_cached_key(|value| {
                value
                    .as_str()
                    .map(requirement_sort_key)
                    .unwrap_or_default()
            });
        }

        let count = entries.len();
        let array = Item::Value(Value::Array(dependency_array(entries)));

        if group == MAIN_GROUP {
            set_entry(project, "dependencies", array);
        } else {
            if !project.contains_key("optional-dependencies") {
                project.insert("optional-dependencies", Item::Table(Table::new()));
            }
            let optional = project
                .get_mut("optional-dependencies")
                .and_then(Item::as_table_like_mut)
                .ok_or_else(|| Error::ManifestFormat {
                    path,
                    message: "project.optional-dependencies is not a table".to_string(),
                })?;
            set_entry(optional, group, array);
        }

        debug!("Wrote {} entries to group {}", count, group);
        Ok(())
    }

    /// Copies the optional group `group` into `[tool.uv] dev-dependencies`.
    ///
    /// Returns false, leaving the document alone, when the manifest has no such group.
    pub fn mirror_uv_dev_dependencies(&mut self, group: &str) -> Result<bool> {
        let Some(entries) = self
            .raw_groups()
            .into_iter()
            .find(|(name, _)| name != MAIN_GROUP && name == group)
            .map(|(_, entries)| entries)
        else {
            return Ok(false);
        };

        let count = entries.len();
        let array = dependency_array(entries.into_iter().map(Value::from).collect::<Vec<_>>());
        let uv = self.tool_table_mut(&["tool", "uv"])?;
        set_entry(uv, "dev-dependencies", Item::Value(Value::Array(array)));

        debug!("Mirrored {} entries of {} into tool.uv", count, group);
        Ok(true)
    }

    /// Sets `[tool.hatch.build.targets.wheel] packages` when it is not already set
    pub fn ensure_hatch_wheel_packages(&mut self, packages: &[&str]) -> Result<bool> {
        let wheel = self.tool_table_mut(&["tool", "hatch", "build", "targets", "wheel"])?;
        if wheel.contains_key("packages") {
            debug!("Keeping existing hatch wheel packages");
            return Ok(false);
        }

        let mut array = toml_edit::Array::new();
        for package in packages {
            array.push(*package);
        }
        wheel.insert("packages", Item::Value(Value::Array(array)));
        Ok(true)
    }

    /// Renders the manifest as TOML text
    pub fn render(&self) -> String {
        if self.created {
            let mut doc = self.doc.clone();
            order_project_fields(&mut doc);
            doc.to_string()
        } else {
            self.doc.to_string()
        }
    }

    /// Writes the manifest to its path, first copying an existing file to its backup
    /// location when `backup` is set. Returns the backup path if one was written.
    pub fn save(&self, backup: bool) -> Result<Option<PathBuf>> {
        let content = self.render();

        let backup_path = if backup {
            create_backup(&self.path)?
        } else {
            None
        };

        write_atomic(&self.path, &content)?;
        info!("Wrote {}", self.path.display());
        Ok(backup_path)
    }

    /// Walks a dotted table path from the root, creating missing tables on the way.
    /// Intermediate tables are created implicit so only the last one gets a header.
    fn tool_table_mut(&mut self, keys: &[&str]) -> Result<&mut dyn TableLike> {
        let path = self.path.clone();
        let mut current: &mut dyn TableLike = self.doc.as_table_mut();

        for (depth, key) in keys.iter().enumerate() {
            if !current.contains_key(key) {
                let mut table = Table::new();
                table.set_implicit(depth + 1 < keys.len());
                current.insert(key, Item::Table(table));
            }
            current = current
                .get_mut(key)
                .and_then(Item::as_table_like_mut)
                .ok_or_else(|| Error::ManifestFormat {
                    path: path.clone(),
                    message: format!("{} is not a table", keys[..=depth].join(".")),
                })?;
        }

        Ok(current)
    }

    fn project_mut(&mut self) -> Result<&mut dyn TableLike> {
        if !self.doc.contains_key("project") {
            self.doc.insert("project", Item::Table(Table::new()));
        }

        let path = self.path.clone();
        self.doc
            .get_mut("project")
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| Error::ManifestFormat {
                path,
                message: "[project] is not a table".to_string(),
            })
    }
}

/// Replaces the value under `key`, keeping the key's own formatting when it exists
fn set_entry(table: &mut dyn TableLike, key: &str, item: Item) {
    match table.get_mut(key) {
        Some(existing) => *existing = item,
        None => {
            table.insert(key, item);
        }
    }
}

fn project_table(metadata: &ProjectMetadata) -> Table {
    let mut project = Table::new();
    project.insert("name", Item::Value(Value::from(metadata.name.as_str())));
    project.insert(
        "version",
        Item::Value(Value::from(metadata.version.as_str())),
    );
    project.insert(
        "description",
        Item::Value(Value::from(metadata.description.as_str())),
    );
    project.insert(
        "requires-python",
        Item::Value(Value::from(metadata.requires_python.as_str())),
    );
    project
}

fn string_entries(array: &toml_edit::Array) -> Vec<String> {
    array
        .iter()
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

/// Rejects manifests whose dependency-related keys have the wrong types
fn check_shape(path: &Path, content: &str) -> Result<()> {
    toml::from_str::<PyProject>(content)
        .map(|_| ())
        .map_err(|e| Error::ManifestFormat {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
}
