use depcon::converters::run_conversion;
use depcon::error::Error;
use depcon::models::{ConversionOptions, MergeMode, ProjectMetadata};
use depcon::utils::BuildBackend;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper function to create a temporary test project.
///
/// # Arguments
///
/// * `files` - A vector of tuples containing filename and content for each file
///
/// # Returns
///
/// A tuple containing the temporary directory and its path
fn create_test_project(files: Vec<(&str, &str)>) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let project_dir = temp_dir.path().to_path_buf();

    for (filename, content) in files {
        fs::write(project_dir.join(filename), content).unwrap();
    }

    (temp_dir, project_dir)
}

fn options_for(project_dir: &Path) -> ConversionOptions {
    ConversionOptions {
        output_file: project_dir.join("pyproject.toml"),
        ..ConversionOptions::default()
    }
}

fn read_doc(path: &Path) -> toml::Value {
    toml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn string_list(value: &toml::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

/// Test the basic end-to-end conversion into a new manifest.
///
/// This test verifies that:
/// 1. Inline comments are dropped
/// 2. Exactly the two dependencies end up in project.dependencies
/// 3. The default hatchling build system is written
/// 4. No backup is created when there was no previous file
#[test]
fn test_convert_creates_manifest() {
    let (_temp_dir, project_dir) = create_test_project(vec![(
        "requirements.txt",
        "requests>=2.0\nclick==8.1.0  # CLI lib\n",
    )]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    let report = run_conversion(&options).unwrap();

    assert!(report.created);
    assert!(report.written);
    assert_eq!(report.backup, None);
    assert_eq!(report.groups, vec![("main".to_string(), 2)]);

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(
        string_list(&doc["project"]["dependencies"]),
        vec!["click==8.1.0", "requests>=2.0"]
    );
    assert_eq!(string_list(&doc["build-system"]["requires"]), vec!["hatchling"]);
    assert_eq!(
        doc["build-system"]["build-backend"].as_str(),
        Some("hatchling.build")
    );
    assert_eq!(doc["project"]["name"].as_str(), Some("project-name"));
    assert!(doc["project"].get("optional-dependencies").is_none());
}

/// Test conversion of every list into an existing manifest.
///
/// This test verifies that:
/// 1. Dev, test, docs and custom groups land in project.optional-dependencies
/// 2. The existing manifest is backed up
/// 3. Existing metadata is kept
#[test]
fn test_convert_all_groups_into_existing_manifest() {
    let original = r#"[project]
name = "my-app"
version = "1.2.3"
description = "An app"
dependencies = ["legacy==0.1"]

[tool.ruff]
line-length = 88
"#;
    let (_temp_dir, project_dir) = create_test_project(vec![
        ("pyproject.toml", original),
        ("requirements.txt", "flask>=2.0\n"),
        ("requirements-dev.txt", "black\n"),
        ("requirements-test.txt", "pytest>=7.0\n"),
        ("requirements-docs.txt", "sphinx\n"),
        ("requirements-lint.txt", "ruff\n"),
    ]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    options.dev_requirements_files = vec![project_dir.join("requirements-dev.txt")];
    options.test_requirements_files = vec![project_dir.join("requirements-test.txt")];
    options.docs_requirements_files = vec![project_dir.join("requirements-docs.txt")];
    options.custom_groups = vec![("lint".to_string(), project_dir.join("requirements-lint.txt"))];
    options.build_backend = BuildBackend::Setuptools;

    let report = run_conversion(&options).unwrap();
    assert!(!report.created);

    let backup = report.backup.unwrap();
    assert_eq!(fs::read_to_string(backup).unwrap(), original);

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(doc["project"]["name"].as_str(), Some("my-app"));
    assert_eq!(doc["project"]["version"].as_str(), Some("1.2.3"));
    assert_eq!(string_list(&doc["project"]["dependencies"]), vec!["flask>=2.0"]);

    let optional = &doc["project"]["optional-dependencies"];
    assert_eq!(string_list(&optional["dev"]), vec!["black"]);
    assert_eq!(string_list(&optional["test"]), vec!["pytest>=7.0"]);
    assert_eq!(string_list(&optional["docs"]), vec!["sphinx"]);
    assert_eq!(string_list(&optional["lint"]), vec!["ruff"]);
    assert_eq!(doc["tool"]["ruff"]["line-length"].as_integer(), Some(88));
    assert_eq!(
        string_list(&doc["build-system"]["requires"]),
        vec!["setuptools", "wheel"]
    );
}

/// Test append mode and disabled sorting.
///
/// This test verifies that:
/// 1. Existing entries are kept ahead of the new ones
/// 2. Input order is kept without sorting
/// 3. No backup is written when disabled
#[test]
fn test_convert_append_without_sort() {
    let (_temp_dir, project_dir) = create_test_project(vec![
        (
            "pyproject.toml",
            "[project]\nname = \"demo\"\nversion = \"0.1.0\"\ndependencies = [\"zlib-ng\"]\n",
        ),
        ("requirements.txt", "pyyaml\nattrs\n"),
    ]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    options.merge_mode = MergeMode::Append;
    options.sort = false;
    options.backup = false;

    let report = run_conversion(&options).unwrap();
    assert_eq!(report.backup, None);
    assert!(!project_dir.join("pyproject.toml.backup").exists());

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(
        string_list(&doc["project"]["dependencies"]),
        vec!["zlib-ng", "pyyaml", "attrs"]
    );
}

/// Test that a malformed input aborts before anything is written.
///
/// This test verifies that:
/// 1. The parse error names the line
/// 2. The manifest is left byte-for-byte unchanged
/// 3. With skip_invalid the conversion goes through
#[test]
fn test_convert_aborts_on_invalid_line() {
    let original = "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n";
    let (_temp_dir, project_dir) = create_test_project(vec![
        ("pyproject.toml", original),
        ("requirements.txt", "requests\nflask >=>= 2\n"),
    ]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];

    let err = run_conversion(&options).unwrap_err();
    assert!(matches!(err, Error::RequirementParse { line: 2, .. }));
    assert_eq!(
        fs::read_to_string(project_dir.join("pyproject.toml")).unwrap(),
        original
    );
    assert!(!project_dir.join("pyproject.toml.backup").exists());

    options.skip_invalid = true;
    let report = run_conversion(&options).unwrap();
    assert_eq!(report.groups, vec![("main".to_string(), 1)]);
}

/// Test discovery when no input file is given.
///
/// This test verifies that:
/// 1. requirements files next to the manifest are found
/// 2. Custom metadata is used for the new manifest
#[test]
fn test_convert_discovers_inputs() {
    let (_temp_dir, project_dir) = create_test_project(vec![
        ("requirements.txt", "requests\n"),
        ("requirements-dev.txt", "pytest\n"),
    ]);

    let mut options = options_for(&project_dir);
    options.metadata = ProjectMetadata {
        name: "discovered".to_string(),
        version: "0.2.0".to_string(),
        description: "Found on disk".to_string(),
        requires_python: ">=3.10".to_string(),
    };

    run_conversion(&options).unwrap();

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(doc["project"]["name"].as_str(), Some("discovered"));
    assert_eq!(doc["project"]["requires-python"].as_str(), Some(">=3.10"));
    assert_eq!(string_list(&doc["project"]["dependencies"]), vec!["requests"]);
    assert_eq!(
        string_list(&doc["project"]["optional-dependencies"]["dev"]),
        vec!["pytest"]
    );
}

/// Test that finding nothing to convert is an error.
#[test]
fn test_convert_without_inputs() {
    let (_temp_dir, project_dir) = create_test_project(vec![]);
    let err = run_conversion(&options_for(&project_dir)).unwrap_err();
    assert!(err.to_string().contains("No requirements files"));
    assert!(!project_dir.join("pyproject.toml").exists());
}

/// Test that empty inputs leave the manifest alone.
///
/// This test verifies that:
/// 1. A requirements file with only comments produces no write
/// 2. The report says nothing was written
#[test]
fn test_convert_empty_input() {
    let (_temp_dir, project_dir) =
        create_test_project(vec![("requirements.txt", "# nothing yet\n\n")]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    let report = run_conversion(&options).unwrap();

    assert!(!report.written);
    assert!(!project_dir.join("pyproject.toml").exists());
}

/// Test editable and local requirements.
///
/// This test verifies that:
/// 1. Editable local projects are written as `name @ file:` references
/// 2. The auto_group and dedupe options apply to the converted records
#[test]
fn test_convert_local_and_grouping_options() {
    let (_temp_dir, project_dir) = create_test_project(vec![(
        "requirements.txt",
        "-e ./plugin\nrequests>=2.0\npytest-cov\nrequests>=2.31\n",
    )]);
    fs::create_dir(project_dir.join("plugin")).unwrap();
    fs::write(
        project_dir.join("plugin/pyproject.toml"),
        "[project]\nname = \"my-plugin\"\n",
    )
    .unwrap();

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    options.auto_group = true;
    options.dedupe = true;

    run_conversion(&options).unwrap();

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(
        string_list(&doc["project"]["dependencies"]),
        vec!["my-plugin @ file:./plugin", "requests>=2.31"]
    );
    assert_eq!(
        string_list(&doc["project"]["optional-dependencies"]["test"]),
        vec!["pytest-cov"]
    );
}

/// Test the opt-in `[tool.*]` output.
///
/// This test verifies that:
/// 1. The dev group is mirrored into `[tool.uv] dev-dependencies`
/// 2. Other `[tool.uv]` keys and comments are kept
/// 3. Hatch wheel packages are added when missing
/// 4. Without the options, `[tool.*]` content is left byte for byte
#[test]
fn test_convert_tool_sections() {
    let original = r#"[project]
name = "my-app"
version = "1.0.0"

[tool.uv]
# keep this comment
package = true
"#;
    let (_temp_dir, project_dir) = create_test_project(vec![
        ("pyproject.toml", original),
        ("requirements.txt", "flask\n"),
        ("requirements-dev.txt", "ruff\nblack\n"),
    ]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    options.dev_requirements_files = vec![project_dir.join("requirements-dev.txt")];

    run_conversion(&options).unwrap();
    let content = fs::read_to_string(project_dir.join("pyproject.toml")).unwrap();
    assert!(content.contains("[tool.uv]\n# keep this comment\npackage = true\n"));
    assert!(!content.contains("dev-dependencies"));
    assert!(!content.contains("tool.hatch"));

    options.uv_dev_dependencies = true;
    options.hatch_wheel_packages = true;
    run_conversion(&options).unwrap();

    let content = fs::read_to_string(project_dir.join("pyproject.toml")).unwrap();
    assert!(content.contains("# keep this comment"));
    assert!(content.contains("[tool.hatch.build.targets.wheel]"));
    assert!(!content.contains("[tool]\n"));

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(
        string_list(&doc["tool"]["uv"]["dev-dependencies"]),
        vec!["black", "ruff"]
    );
    assert_eq!(doc["tool"]["uv"]["package"].as_bool(), Some(true));
    assert_eq!(
        string_list(&doc["tool"]["hatch"]["build"]["targets"]["wheel"]["packages"]),
        vec!["src"]
    );
}

/// Test that built-in groups cannot be renamed onto the main list.
///
/// This test verifies that:
/// 1. A dev group named `main` is rejected before anything is read
/// 2. No manifest is written
#[test]
fn test_convert_rejects_main_group_name() {
    let (_temp_dir, project_dir) = create_test_project(vec![
        ("requirements.txt", "requests\n"),
        ("requirements-dev.txt", "pytest\n"),
    ]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    options.dev_requirements_files = vec![project_dir.join("requirements-dev.txt")];
    options.group_names.dev = "main".to_string();

    let err = run_conversion(&options).unwrap_err();
    assert!(err.contains("reserved for project.dependencies"));
    assert!(!project_dir.join("pyproject.toml").exists());
}

/// Test that a byte-order mark at the start of a requirements file is ignored.
#[test]
fn test_convert_byte_order_mark() {
    let (_temp_dir, project_dir) = create_test_project(vec![(
        "requirements.txt",
        "\u{feff}requests>=2.0\nclick\n",
    )]);

    let mut options = options_for(&project_dir);
    options.requirements_files = vec![project_dir.join("requirements.txt")];
    run_conversion(&options).unwrap();

    let doc = read_doc(&project_dir.join("pyproject.toml"));
    assert_eq!(
        string_list(&doc["project"]["dependencies"]),
        vec!["click", "requests>=2.0"]
    );
}
