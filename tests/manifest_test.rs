use depcon::error::Error;
use depcon::manifest::Manifest;
use depcon::models::{DependencySpec, MergeMode, ProjectMetadata};
use depcon::parser::parse_requirement;
use depcon::utils::BuildBackend;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_manifest(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("pyproject.toml");
    fs::write(&path, content).unwrap();
    path
}

fn specs(requirements: &[&str]) -> Vec<DependencySpec> {
    requirements
        .iter()
        .map(|r| parse_requirement(r).unwrap())
        .collect()
}

/// Test synthesis of a new manifest.
///
/// This test verifies that:
/// 1. `[build-system]` is written first, for the chosen backend
/// 2. `[project]` gets name, version, description and requires-python
/// 3. Dependencies are written one per line
#[test]
fn test_create_new_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pyproject.toml");
    let metadata = ProjectMetadata {
        name: "demo".to_string(),
        ..ProjectMetadata::default()
    };

    let mut manifest = Manifest::load_or_create(&path, &metadata, BuildBackend::Setuptools).unwrap();
    assert!(manifest.is_new());
    manifest
        .apply_group("main", &specs(&["requests>=2.0"]), MergeMode::Replace, true)
        .unwrap();

    let rendered = manifest.render();
    assert_eq!(
        rendered,
        r#"[build-system]
requires = ["setuptools", "wheel"]
build-backend = "setuptools.build_meta"

[project]
name = "demo"
version = "0.1.0"
description = ""
requires-python = ">=3.8"
dependencies = [
    "requests>=2.0",
]
"#
    );
}

/// Test that unrelated content survives an update byte for byte.
///
/// This test verifies that:
/// 1. Comments and tool sections are untouched
/// 2. Only the written dependency list changes
/// 3. An existing `[build-system]` is never replaced
#[test]
fn test_unrelated_sections_preserved() {
    let temp_dir = TempDir::new().unwrap();
    let original = r#"# Project manifest
[project]
name = "existing"   # keep this comment
version = "2.0.0"
dependencies = ["old-package==1.0"]

[tool.black]
line-length = 100
target-version = ['py311']

[build-system]
requires = ["flit_core>=3.2"]
build-backend = "flit_core.buildapi"
"#;
    let path = write_manifest(temp_dir.path(), original);

    let mut manifest = Manifest::open(&path).unwrap();
    assert!(!manifest.ensure_build_system(BuildBackend::Hatchling));
    manifest
        .apply_group("main", &specs(&["requests>=2.0"]), MergeMode::Replace, true)
        .unwrap();
    let rendered = manifest.render();

    let expected = original.replace(
        r#"dependencies = ["old-package==1.0"]"#,
        "dependencies = [\n    \"requests>=2.0\",\n]",
    );
    assert_eq!(rendered, expected);
}

/// Test replace and append merge modes.
///
/// This test verifies that:
/// 1. Replace makes the group exactly the new list
/// 2. Append keeps existing entries verbatim ahead of the new ones
/// 3. Other groups are left untouched
#[test]
fn test_merge_modes() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(
        temp_dir.path(),
        r#"[project]
name = "demo"
version = "0.1.0"
dependencies = ["Flask >= 2.0"]

[project.optional-dependencies]
dev = ["pytest"]
docs = ["sphinx"]
"#,
    );

    let mut manifest = Manifest::open(&path).unwrap();
    manifest
        .apply_group("main", &specs(&["click"]), MergeMode::Append, false)
        .unwrap();
    manifest
        .apply_group("dev", &specs(&["ruff"]), MergeMode::Replace, false)
        .unwrap();

    let config = manifest.project_config().unwrap();
    let raw = manifest.raw_groups();
    assert_eq!(raw[0].1, vec!["Flask >= 2.0", "click"]);
    assert_eq!(config.group("dev").unwrap().dependencies[0].name, "ruff");
    assert_eq!(config.group("dev").unwrap().len(), 1);
    assert_eq!(config.group("docs").unwrap().dependencies[0].name, "sphinx");
}

/// Test sorting of written groups.
///
/// This test verifies that:
/// 1. Entries are ordered by normalized name, case-insensitively
/// 2. Entries with the same name keep their relative order
#[test]
fn test_sorted_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pyproject.toml");

    let mut manifest =
        Manifest::load_or_create(&path, &ProjectMetadata::default(), BuildBackend::Hatchling)
            .unwrap();
    manifest
        .apply_group(
            "main",
            &specs(&["zope>=1", "Django>=4", "attrs", "django<5", "Babel"]),
            MergeMode::Replace,
            true,
        )
        .unwrap();

    let raw = manifest.raw_groups();
    assert_eq!(
        raw[0].1,
        vec!["attrs", "Babel", "Django>=4", "django<5", "zope>=1"]
    );
}

/// Test that optional groups are created under `[project.optional-dependencies]`.
///
/// This test verifies that:
/// 1. A missing optional-dependencies table is created
/// 2. An inline optional-dependencies table is updated in place
#[test]
fn test_optional_groups() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(
        temp_dir.path(),
        r#"[project]
name = "demo"
version = "0.1.0"
optional-dependencies = { dev = ["pytest"] }
"#,
    );

    let mut manifest = Manifest::open(&path).unwrap();
    manifest
        .apply_group("test", &specs(&["pytest-cov"]), MergeMode::Replace, true)
        .unwrap();

    let raw = manifest.raw_groups();
    let group_names: Vec<&str> = raw.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(group_names, vec!["dev", "test"]);
    assert_eq!(raw[1].1, vec!["pytest-cov"]);
}

/// Test metadata filling on an existing manifest.
///
/// This test verifies that:
/// 1. A missing name is added
/// 2. A version listed in `dynamic` is not added
/// 3. A missing `[build-system]` is added
#[test]
fn test_fill_missing_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_manifest(
        temp_dir.path(),
        "[project]\ndynamic = [\"version\"]\n",
    );

    let mut manifest = Manifest::open(&path).unwrap();
    manifest
        .fill_missing_metadata(&ProjectMetadata::default())
        .unwrap();
    assert!(manifest.ensure_build_system(BuildBackend::Poetry));

    let doc = manifest.document();
    assert_eq!(doc["project"]["name"].as_str(), Some("project-name"));
    assert!(doc["project"].get("version").is_none());
    assert_eq!(
        doc["build-system"]["build-backend"].as_str(),
        Some("poetry.core.masonry.api")
    );
}

/// Test rejection of malformed manifests.
///
/// This test verifies that:
/// 1. A TOML syntax error is a manifest format error naming the file
/// 2. A dependency list with the wrong type is a manifest format error
#[test]
fn test_malformed_manifest() {
    let temp_dir = TempDir::new().unwrap();

    let path = write_manifest(temp_dir.path(), "[project\nname = \"broken\"\n");
    let err = Manifest::open(&path).unwrap_err();
    assert!(matches!(err, Error::ManifestFormat { .. }));
    assert!(err.to_string().contains("pyproject.toml"));

    let path = write_manifest(temp_dir.path(), "[project]\ndependencies = \"requests\"\n");
    let err = Manifest::open(&path).unwrap_err();
    assert!(matches!(err, Error::ManifestFormat { .. }));
}

/// Test saving with and without a backup.
///
/// This test verifies that:
/// 1. The previous file is copied to `<name>.backup`
/// 2. The new content replaces the file
/// 3. No backup is written when disabled
#[test]
fn test_save_with_backup() {
    let temp_dir = TempDir::new().unwrap();
    let original = "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n";
    let path = write_manifest(temp_dir.path(), original);

    let mut manifest = Manifest::open(&path).unwrap();
    manifest
        .apply_group("main", &specs(&["requests"]), MergeMode::Replace, true)
        .unwrap();
    let backup = manifest.save(true).unwrap().unwrap();

    assert_eq!(backup, temp_dir.path().join("pyproject.toml.backup"));
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);
    assert!(fs::read_to_string(&path).unwrap().contains("\"requests\""));

    fs::remove_file(&backup).unwrap();
    assert_eq!(manifest.save(false).unwrap(), None);
    assert!(!backup.exists());
}
