use crate::models::{DependencyGroup, DependencyType, GroupNames, SourcedDependency};
use log::debug;

/// Tools that belong with the test suite rather than the runtime dependencies
const TEST_PACKAGES: &[&str] = &[
    "pytest-cov",
    "pytest-mock",
    "pytest-xdist",
    "pytest-asyncio",
    "coverage",
    "factory-boy",
    "faker",
    "responses",
    "aioresponses",
];

const DOCS_PACKAGES: &[&str] = &[
    "sphinx",
    "mkdocs",
    "sphinx-rtd-theme",
    "myst-parser",
    "sphinx-autodoc-typehints",
];

const DEV_PACKAGES: &[&str] = &[
    "pytest",
    "black",
    "isort",
    "flake8",
    "mypy",
    "ruff",
    "pre-commit",
    "tox",
    "nox",
    "jupyter",
    "ipython",
    "notebook",
    "jupyterlab",
];

/// Partitions dependencies into groups named after their source list.
///
/// Groups come out as main, dev, test, docs, then custom groups in the order they were
/// first seen; dependencies keep their input order inside a group. With `dedupe`, a later
/// dependency with the same normalized name replaces the earlier one in its position.
pub fn group_dependencies(
    dependencies: Vec<SourcedDependency>,
    names: &GroupNames,
    dedupe: bool,
) -> Vec<DependencyGroup> {
    let mut groups: Vec<(u8, DependencyGroup)> = Vec::new();

    for SourcedDependency { spec, dep_type } in dependencies {
        let name = names.resolve(&dep_type);
        let index = match groups.iter().position(|(_, group)| group.name == name) {
            Some(index) => index,
            None => {
                groups.push((dep_type.rank(), DependencyGroup::new(name)));
                groups.len() - 1
            }
        };

        let group = &mut groups[index].1;
        if dedupe {
            group.upsert(spec);
        } else {
            group.push(spec);
        }
    }

    // Stable, so custom groups stay in first-seen order
    groups.sort_by_key(|(rank, _)| *rank);

    for (_, group) in &groups {
        debug!("Group {} has {} dependencies", group.name, group.len());
    }

    groups.into_iter().map(|(_, group)| group).collect()
}

/// Moves well-known test, docs and dev tools out of the main list.
///
/// Test packages are checked first, then docs, then dev. Dependencies from any other
/// list are left where they are.
pub fn auto_categorize(dependencies: Vec<SourcedDependency>) -> Vec<SourcedDependency> {
    dependencies
        .into_iter()
        .map(|mut dep| {
            if dep.dep_type == DependencyType::Main {
                if let Some(dep_type) = categorize(&dep.spec.normalized_name()) {
                    debug!("Moving {} to the {:?} group", dep.spec.name, dep_type);
                    dep.dep_type = dep_type;
                }
            }
            dep
        })
        .collect()
}

fn categorize(name: &str) -> Option<DependencyType> {
    if TEST_PACKAGES.contains(&name) {
        Some(DependencyType::Test)
    } else if DOCS_PACKAGES.contains(&name) {
        Some(DependencyType::Docs)
    } else if DEV_PACKAGES.contains(&name) {
        Some(DependencyType::Dev)
    } else {
        None
    }
}
