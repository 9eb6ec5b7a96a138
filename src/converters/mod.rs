use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::models::{ConversionOptions, SourcedDependency};
use log::{info, warn};
use std::path::{Path, PathBuf};

pub mod grouping;
pub mod requirements;

pub use grouping::{auto_categorize, group_dependencies};
pub use requirements::{ParseOptions, RequirementsSource, read_requirements_file};

/// Trait for sources that can extract dependencies for conversion
pub trait DependencySource {
    /// Extracts every dependency, tagged with the list it belongs to
    fn extract_dependencies(&self) -> Result<Vec<SourcedDependency>>;
}

/// What a conversion run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Manifest that was targeted
    pub output: PathBuf,

    /// Backup of the previous manifest, if one was written
    pub backup: Option<PathBuf>,

    /// Whether the manifest was created rather than updated
    pub created: bool,

    /// Whether anything was written
    pub written: bool,

    /// Dependencies written per group, in output order
    pub groups: Vec<(String, usize)>,
}

/// Converts requirements files into the manifest named by `options.output_file`.
///
/// When no input file is given, conventionally named requirements files next to the
/// manifest are used. Nothing is written if any input fails to parse.
pub fn run_conversion(options: &ConversionOptions) -> Result<ConversionReport> {
    options.group_names.check().map_err(Error::General)?;

    if options.resolve {
        warn!("Dependency resolution is not supported; dependencies are written as declared");
    }

    let mut inputs = options.input_files();
    if inputs.is_empty() {
        let dir = match options.output_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        inputs = RequirementsSource::discover(&dir);
        if inputs.is_empty() {
            return Err(Error::General(format!(
                "No requirements files given and none found in {}",
                dir.display()
            )));
        }
    }

    let source = RequirementsSource::new(
        inputs,
        ParseOptions {
            skip_invalid: options.skip_invalid,
            follow_includes: options.follow_includes,
        },
    );
    let mut dependencies = source.extract_dependencies()?;

    if options.auto_group {
        dependencies = auto_categorize(dependencies);
    }

    let groups = group_dependencies(dependencies, &options.group_names, options.dedupe);

    let mut report = ConversionReport {
        output: options.output_file.clone(),
        ..ConversionReport::default()
    };

    if groups.is_empty() {
        warn!(
            "No dependencies found in the input files, leaving {} unchanged",
            options.output_file.display()
        );
        return Ok(report);
    }

    for group in &groups {
        info!("Found {} {} dependencies", group.len(), group.name);
    }

    let mut manifest = Manifest::load_or_create(
        &options.output_file,
        &options.metadata,
        options.build_backend,
    )?;
    report.created = manifest.is_new();

    if !manifest.is_new() {
        manifest.fill_missing_metadata(&options.metadata)?;
        if manifest.ensure_build_system(options.build_backend) {
            info!("Added [build-system] for {}", options.build_backend);
        }
    }

    for group in &groups {
        for dep in group.dependencies.iter().filter(|d| d.editable || d.is_local()) {
            warn!(
                "{} is an editable or local requirement; writing it as '{}'",
                dep.name,
                dep.to_requirement_string()
            );
        }
        manifest.apply_group(&group.name, &group.dependencies, options.merge_mode, options.sort)?;
        report.groups.push((group.name.clone(), group.len()));
    }

    if options.uv_dev_dependencies {
        let dev = &options.group_names.dev;
        if manifest.mirror_uv_dev_dependencies(dev)? {
            info!("Mirrored the {} group into [tool.uv]", dev);
        } else {
            warn!("No {} group in the manifest, [tool.uv] left unchanged", dev);
        }
    }

    if options.hatch_wheel_packages && manifest.ensure_hatch_wheel_packages(&["src"])? {
        info!("Added hatch wheel packages");
    }

    report.backup = manifest.save(options.backup)?;
    report.written = true;
    log_summary(&report, manifest.path());

    Ok(report)
}

fn log_summary(report: &ConversionReport, path: &Path) {
    let total: usize = report.groups.iter().map(|(_, count)| count).sum();
    let action = if report.created { "Created" } else { "Updated" };
    info!(
        "{} {} with {} dependencies in {} groups",
        action,
        path.display(),
        total,
        report.groups.len()
    );
}
