use crate::converters::run_conversion;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::manifest::show::render_dependencies;
use crate::manifest::validate::validate_manifest;
use crate::models::{
    ConversionOptions, GroupNames, MergeMode, OutputFormat, ProjectMetadata, check_group_name,
};
use crate::utils::build_system::BuildBackend;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::info;
use std::ffi::OsString;
use std::path::PathBuf;

/// How much the tool logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// Default `env_logger` filter; `RUST_LOG` still takes precedence
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// A parsed subcommand
#[derive(Debug, Clone)]
pub enum CliCommand {
    /// Convert requirements files into a manifest
    Convert(ConversionOptions),

    /// Print the dependencies of a manifest
    Show { file: PathBuf, format: OutputFormat },

    /// Check every dependency string of a manifest
    Validate { file: PathBuf, group: Option<String> },
}

/// Command line arguments for depcon
#[derive(Debug, Clone)]
pub struct Args {
    pub verbosity: Verbosity,
    pub command: CliCommand,
}

/// Builds the clap command tree
pub fn build_command() -> Command {
    let after_help = "EXAMPLES:
# Convert requirements.txt and requirements-dev.txt found next to pyproject.toml
depcon convert

# Convert explicit files into a new manifest
depcon convert -r requirements.txt -d requirements-dev.txt -o pyproject.toml

# Add a custom group without touching the existing ones
depcon convert --group lint=requirements-lint.txt --append

# Show the dependencies of a manifest as JSON
depcon show --format json

# Validate only the dev group
depcon validate --group dev";

    Command::new("depcon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert requirements files into pyproject.toml dependencies")
        .long_about(
            "depcon reads pip-style requirements files and writes their dependencies into the \
            [project] table of a pyproject.toml. Existing manifests are updated in place: \
            sections that are not being written keep their exact formatting.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .conflicts_with("quiet")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log warnings and errors")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(convert_command())
        .subcommand(
            Command::new("show")
                .about("Show the dependencies of a pyproject.toml")
                .arg(file_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .help("Output format")
                        .value_parser(["table", "json", "yaml"])
                        .default_value("table"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check that every dependency in a pyproject.toml is well-formed")
                .arg(file_arg())
                .arg(
                    Arg::new("group")
                        .long("group")
                        .value_name("NAME")
                        .help("Only validate this group ('main' for project.dependencies)"),
                ),
        )
        .after_help(after_help)
}

fn file_arg() -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .value_name("PATH")
        .help("The pyproject.toml to read")
        .value_parser(clap::value_parser!(PathBuf))
        .default_value("pyproject.toml")
}

fn input_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name("FILE")
        .help(help)
        .action(ArgAction::Append)
        .value_parser(clap::value_parser!(PathBuf))
}

/// Adds an on/off flag pair where the last one given wins
fn toggle(
    cmd: Command,
    on: &'static str,
    off: &'static str,
    help_on: &'static str,
    help_off: &'static str,
) -> Command {
    cmd.arg(
        Arg::new(on)
            .long(on)
            .help(help_on)
            .overrides_with(off)
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new(off)
            .long(off)
            .help(help_off)
            .overrides_with(on)
            .action(ArgAction::SetTrue),
    )
}

fn convert_command() -> Command {
    let mut cmd = Command::new("convert")
        .about("Convert requirements files into pyproject.toml dependencies")
        .long_about(
            "Parses the given requirements files and writes their dependencies into \
            project.dependencies and project.optional-dependencies. When no file is given, \
            requirements.txt and requirements-<group>.txt (or .in) files next to the output \
            manifest are used.",
        )
        .arg(input_arg("requirements", "Main requirements file").short('r'))
        .arg(input_arg("dev-requirements", "Development requirements file").short('d'))
        .arg(input_arg("test-requirements", "Test requirements file").short('t'))
        .arg(input_arg("docs-requirements", "Documentation requirements file"))
        .arg(
            Arg::new("group")
                .long("group")
                .value_name("NAME=PATH")
                .help("Requirements file for a custom optional group")
                .action(ArgAction::Append)
                .value_parser(parse_group_spec),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("The pyproject.toml to create or update")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("pyproject.toml"),
        );

    cmd = toggle(
        cmd,
        "append",
        "no-append",
        "Add to existing groups instead of replacing them",
        "Replace existing groups (default)",
    );
    cmd = toggle(
        cmd,
        "backup",
        "no-backup",
        "Copy an existing manifest to <name>.backup first (default)",
        "Do not back up the existing manifest",
    );
    cmd = toggle(
        cmd,
        "resolve",
        "no-resolve",
        "Accepted for compatibility; dependencies are not resolved",
        "Do not resolve dependencies (default)",
    );
    cmd = toggle(
        cmd,
        "sort",
        "no-sort",
        "Sort every written group by package name (default)",
        "Keep dependencies in input order",
    );

    cmd.arg(
        Arg::new("build-backend")
            .long("build-backend")
            .value_name("BACKEND")
            .help("Build backend for a new [build-system]: hatchling, setuptools or poetry")
            .value_parser(|s: &str| s.parse::<BuildBackend>())
            .default_value("hatchling"),
    )
    .arg(group_name_arg("dev-group", "Name of the development group").default_value("dev"))
    .arg(group_name_arg("test-group", "Name of the test group").default_value("test"))
    .arg(group_name_arg("docs-group", "Name of the documentation group").default_value("docs"))
    .arg(named_value("project-name", "NAME", "Project name for a new manifest"))
    .arg(named_value("project-version", "VERSION", "Project version for a new manifest"))
    .arg(named_value(
        "project-description",
        "TEXT",
        "Project description for a new manifest",
    ))
    .arg(named_value("python-version", "SPEC", "requires-python for a new manifest"))
    .arg(
        Arg::new("dedupe")
            .long("dedupe")
            .help("Keep only the last entry for a package within a group")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("skip-invalid")
            .long("skip-invalid")
            .help("Warn about malformed requirement lines instead of failing")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("no-follow-includes")
            .long("no-follow-includes")
            .help("Ignore -r/--requirement lines")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("auto-group")
            .long("auto-group")
            .help("Move well-known test, docs and dev tools out of the main dependencies")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("uv-dev-dependencies")
            .long("uv-dev-dependencies")
            .help("Also write the dev group to [tool.uv] dev-dependencies")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("hatch-wheel-packages")
            .long("hatch-wheel-packages")
            .help("Set [tool.hatch.build.targets.wheel] packages to [\"src\"] when missing")
            .action(ArgAction::SetTrue),
    )
}

fn named_value(id: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).value_name(value_name).help(help)
}

fn group_name_arg(id: &'static str, help: &'static str) -> Arg {
    named_value(id, "NAME", help).value_parser(parse_group_name)
}

fn parse_group_name(value: &str) -> std::result::Result<String, String> {
    check_group_name(value)?;
    Ok(value.trim().to_string())
}

/// Parses a `NAME=PATH` custom group argument
fn parse_group_spec(value: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", value))?;
    let name = name.trim();
    if name.is_empty() || path.trim().is_empty() {
        return Err(format!("expected NAME=PATH, got '{}'", value));
    }
    Ok((name.to_string(), PathBuf::from(path.trim())))
}

/// Parses the process arguments, exiting with usage on error or for --help/--version
pub fn parse_args() -> Args {
    let matches = build_command().get_matches();
    args_from_matches(&matches)
}

/// Parses an explicit argument list, the first item being the binary name
pub fn parse_args_from<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command()
        .try_get_matches_from(args)
        .map_err(|e| Error::General(e.to_string()))?;
    Ok(args_from_matches(&matches))
}

fn args_from_matches(matches: &ArgMatches) -> Args {
    let verbosity = if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };

    let command = match matches.subcommand() {
        Some(("show", sub)) => CliCommand::Show {
            file: path_value(sub, "file"),
            format: sub
                .get_one::<String>("format")
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
        },
        Some(("validate", sub)) => CliCommand::Validate {
            file: path_value(sub, "file"),
            group: sub.get_one::<String>("group").cloned(),
        },
        Some(("convert", sub)) => CliCommand::Convert(conversion_options(sub)),
        _ => CliCommand::Convert(ConversionOptions::default()),
    };

    Args { verbosity, command }
}

fn path_value(matches: &ArgMatches, id: &str) -> PathBuf {
    matches
        .get_one::<PathBuf>(id)
        .cloned()
        .unwrap_or_else(|| PathBuf::from("pyproject.toml"))
}

fn paths(matches: &ArgMatches, id: &str) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>(id)
        .unwrap_or_default()
        .cloned()
        .collect()
}

fn string_value(matches: &ArgMatches, id: &str, fallback: String) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or(fallback)
}

fn conversion_options(matches: &ArgMatches) -> ConversionOptions {
    let metadata = ProjectMetadata::default();
    let group_names = GroupNames::default();

    ConversionOptions {
        requirements_files: paths(matches, "requirements"),
        dev_requirements_files: paths(matches, "dev-requirements"),
        test_requirements_files: paths(matches, "test-requirements"),
        docs_requirements_files: paths(matches, "docs-requirements"),
        custom_groups: matches
            .get_many::<(String, PathBuf)>("group")
            .unwrap_or_default()
            .cloned()
            .collect(),
        output_file: path_value(matches, "output"),
        merge_mode: if matches.get_flag("append") {
            MergeMode::Append
        } else {
            MergeMode::Replace
        },
        backup: !matches.get_flag("no-backup"),
        resolve: matches.get_flag("resolve"),
        sort: !matches.get_flag("no-sort"),
        build_backend: matches
            .get_one::<BuildBackend>("build-backend")
            .copied()
            .unwrap_or_default(),
        group_names: GroupNames {
            dev: string_value(matches, "dev-group", group_names.dev),
            test: string_value(matches, "test-group", group_names.test),
            docs: string_value(matches, "docs-group", group_names.docs),
        },
        metadata: ProjectMetadata {
            name: string_value(matches, "project-name", metadata.name),
            version: string_value(matches, "project-version", metadata.version),
            description: string_value(matches, "project-description", metadata.description),
            requires_python: string_value(matches, "python-version", metadata.requires_python),
        },
        dedupe: matches.get_flag("dedupe"),
        skip_invalid: matches.get_flag("skip-invalid"),
        follow_includes: !matches.get_flag("no-follow-includes"),
        auto_group: matches.get_flag("auto-group"),
        uv_dev_dependencies: matches.get_flag("uv-dev-dependencies"),
        hatch_wheel_packages: matches.get_flag("hatch-wheel-packages"),
    }
}

/// Runs the parsed command
pub fn execute(args: &Args) -> Result<()> {
    match &args.command {
        CliCommand::Convert(options) => {
            info!("Converting into {}", options.output_file.display());
            let report = run_conversion(options)?;
            if let Some(backup) = &report.backup {
                info!("Previous manifest saved as {}", backup.display());
            }
            Ok(())
        }
        CliCommand::Show { file, format } => {
            let config = Manifest::open(file)?.project_config()?;
            print!("{}", render_dependencies(&config, *format)?);
            Ok(())
        }
        CliCommand::Validate { file, group } => {
            let manifest = Manifest::open(file)?;
            let issues = validate_manifest(&manifest, group.as_deref())?;
            if !issues.is_empty() {
                return Err(Error::Validation(issues));
            }
            info!("All dependencies in {} are valid", file.display());
            Ok(())
        }
    }
}
