use super::DependencySource;
use crate::error::{Error, Result};
use crate::models::{DependencySpec, DependencyType, SourcedDependency};
use crate::parser::{RequirementEntry, RequirementsParser};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// How requirements files are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Warn about malformed lines instead of failing
    pub skip_invalid: bool,

    /// Read files referenced with `-r`/`--requirement`
    pub follow_includes: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            skip_invalid: false,
            follow_includes: true,
        }
    }
}

/// Requirements files, each tagged with the dependency list it feeds
pub struct RequirementsSource {
    files: Vec<(PathBuf, DependencyType)>,
    options: ParseOptions,
}

impl DependencySource for RequirementsSource {
    fn extract_dependencies(&self) -> Result<Vec<SourcedDependency>> {
        let mut dependencies = Vec::new();

        for (file_path, dep_type) in &self.files {
            info!("Processing requirements file: {}", file_path.display());
            let specs = read_requirements_file(file_path, self.options)?;
            debug!("Extracted {} dependencies", specs.len());
            dependencies.extend(
                specs
                    .into_iter()
                    .map(|spec| SourcedDependency::new(spec, dep_type.clone())),
            );
        }

        debug!("Total dependencies extracted: {}", dependencies.len());
        Ok(dependencies)
    }
}

impl RequirementsSource {
    pub fn new(files: Vec<(PathBuf, DependencyType)>, options: ParseOptions) -> Self {
        Self { files, options }
    }

    /// Finds requirements files in `dir` by their conventional names.
    ///
    /// `requirements.txt` feeds the main list and `requirements-<name>.txt` the group
    /// `<name>`. A pip-tools `.in` source wins over the `.txt` compiled from it. Files come
    /// back as main, dev, test, docs, then custom groups by name.
    pub fn discover(dir: &Path) -> Vec<(PathBuf, DependencyType)> {
        let mut stems: Vec<String> = Vec::new();

        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.filter_map(|entry| entry.ok()) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let Some(stem) = file_name
                    .strip_suffix(".txt")
                    .or_else(|| file_name.strip_suffix(".in"))
                else {
                    continue;
                };
                if (stem == "requirements" || stem.starts_with("requirements-"))
                    && !stems.iter().any(|s| s == stem)
                {
                    stems.push(stem.to_string());
                }
            }
        }

        let mut found: Vec<(PathBuf, DependencyType)> = stems
            .into_iter()
            .filter_map(|stem| {
                let dep_type = match stem.strip_prefix("requirements-") {
                    None => DependencyType::Main,
                    Some(group) => group.parse::<DependencyType>().ok()?,
                };
                let source = dir.join(format!("{}.in", stem));
                let path = if source.is_file() {
                    source
                } else {
                    dir.join(format!("{}.txt", stem))
                };
                info!("Found requirements file: {}", path.display());
                Some((path, dep_type))
            })
            .collect();

        found.sort_by(|(a_path, a_type), (b_path, b_type)| {
            a_type.rank().cmp(&b_type.rank()).then_with(|| a_path.cmp(b_path))
        });
        found
    }
}

/// Parses a requirements file, following `-r` includes relative to the including file
pub fn read_requirements_file(
    path: &Path,
    options: ParseOptions,
) -> Result<Vec<DependencySpec>> {
    let mut stack = Vec::new();
    let mut specs = Vec::new();
    read_into(path, options, &mut stack, &mut specs)?;
    Ok(specs)
}

fn read_into(
    path: &Path,
    options: ParseOptions,
    stack: &mut Vec<PathBuf>,
    specs: &mut Vec<DependencySpec>,
) -> Result<()> {
    if !path.is_file() {
        return Err(Error::FileOperation {
            path: path.to_path_buf(),
            message: "Requirements file not found".to_string(),
        });
    }

    let canonical = fs::canonicalize(path).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!("Failed to resolve path: {}", e),
    })?;
    if stack.contains(&canonical) {
        return Err(Error::IncludeCycle {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!("Failed to read requirements file: {}", e),
    })?;

    stack.push(canonical);
    let mut parser = RequirementsParser::with_source(&content, path);
    while let Some(entry) = parser.next_entry() {
        match entry {
            Ok(RequirementEntry::Dependency(spec)) => specs.push(spec),
            Ok(RequirementEntry::Include(include)) if options.follow_includes => {
                debug!("Following include {}", include.display());
                read_into(&include, options, stack, specs)?;
            }
            Ok(RequirementEntry::Include(include)) => {
                debug!("Not following include of {}", include.display());
            }
            Err(e @ Error::RequirementParse { .. }) if options.skip_invalid => {
                warn!("Skipping invalid requirement: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
    stack.pop();

    Ok(())
}
