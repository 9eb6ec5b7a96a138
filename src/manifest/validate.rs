use super::Manifest;
use crate::error::{Error, Result, ValidationIssue};
use crate::models::DependencySpec;
use crate::parser::parse_requirement;
use log::debug;

/// Checks that a dependency string parses and that its canonical form parses back
/// to the same requirement
pub fn check_requirement(requirement: &str) -> std::result::Result<DependencySpec, String> {
    let spec = parse_requirement(requirement)?;
    let canonical = spec.to_requirement_string();
    let reparsed = parse_requirement(&canonical)
        .map_err(|e| format!("canonical form '{}' does not parse: {}", canonical, e))?;

    if !spec.is_equivalent(&reparsed) {
        return Err(format!(
            "canonical form '{}' does not describe the same requirement",
            canonical
        ));
    }

    Ok(spec)
}

/// Validates every dependency string in the manifest, or only those of `group`.
///
/// `main` selects `project.dependencies`. Returns every failing string; an unknown
/// group is an error.
pub fn validate_manifest(manifest: &Manifest, group: Option<&str>) -> Result<Vec<ValidationIssue>> {
    let groups = manifest.raw_groups();

    if let Some(wanted) = group {
        if !groups.iter().any(|(name, _)| name == wanted) {
            return Err(Error::General(format!(
                "Group '{}' not found in {}",
                wanted,
                manifest.path().display()
            )));
        }
    }

    let mut issues = Vec::new();
    let mut checked = 0;
    for (name, requirements) in groups
        .iter()
        .filter(|(name, _)| group.is_none_or(|wanted| wanted == name.as_str()))
    {
        for requirement in requirements {
            checked += 1;
            if let Err(message) = check_requirement(requirement) {
                issues.push(ValidationIssue {
                    group: name.clone(),
                    requirement: requirement.clone(),
                    message,
                });
            }
        }
    }

    debug!("Checked {} dependencies, {} invalid", checked, issues.len());
    Ok(issues)
}
