//! Grammar for a single requirement: `name[extras] constraints ; markers`,
//! `name[extras] @ url ; markers`, or a bare VCS/archive URL.

use crate::models::{DependencySpec, normalize_name};
use regex::Regex;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?").unwrap());

static EXTRA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$").unwrap());

static SPECIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(===|~=|==|!=|<=|>=|<|>)\s*([A-Za-z0-9_.*+!-]+)$").unwrap()
});

const URL_PREFIXES: &[&str] = &[
    "git+", "hg+", "svn+", "bzr+", "http://", "https://", "ftp://",
];

/// Parses one requirement into a [`DependencySpec`].
///
/// The input must already be free of comments, line continuations and pip
/// options; [`crate::parser::RequirementsParser`] takes care of those.
pub fn parse_requirement(input: &str) -> Result<DependencySpec, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Empty requirement".to_string());
    }

    if is_url(input) {
        return parse_bare_url(input);
    }

    let name_match = NAME_RE
        .find(input)
        .ok_or_else(|| format!("Expected a package name at '{}'", input))?;
    let mut spec = DependencySpec::new(name_match.as_str());
    let mut rest = input[name_match.end()..].trim_start();

    if let Some(after_bracket) = rest.strip_prefix('[') {
        let close = after_bracket
            .find(']')
            .ok_or_else(|| "Unclosed extras bracket".to_string())?;
        spec.extras = parse_extras(&after_bracket[..close])?;
        rest = after_bracket[close + 1..].trim_start();
    }

    if let Some(reference) = rest.strip_prefix('@') {
        let (url, markers) = split_url_reference(reference)?;
        spec.url = Some(url);
        spec.markers = markers;
        return Ok(spec);
    }

    let (constraints, markers) = match rest.split_once(';') {
        Some((constraints, markers)) => (constraints.trim(), Some(parse_markers(markers)?)),
        None => (rest.trim(), None),
    };

    if !constraints.is_empty() {
        spec.version_specs = parse_specifiers(constraints)?;
    }
    spec.markers = markers;

    Ok(spec)
}

/// Whether the requirement is a bare URL rather than a named requirement
pub fn is_url(input: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| input.starts_with(prefix))
}

/// Whether the requirement points at a local directory or archive
pub fn is_local_path(input: &str) -> bool {
    input == "."
        || input.starts_with("./")
        || input.starts_with("../")
        || input.starts_with(".\\")
        || input.starts_with("..\\")
        || input.starts_with('/')
        || input.starts_with("file:")
}

/// Sort key for a raw requirement string: its normalized name, or the lowercased text
/// when no name can be read from it
pub fn requirement_sort_key(input: &str) -> String {
    match parse_requirement(input) {
        Ok(spec) => spec.normalized_name(),
        Err(_) => input.trim().to_lowercase(),
    }
}

fn parse_extras(inner: &str) -> Result<Vec<String>, String> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|extra| {
            let extra = extra.trim();
            if EXTRA_RE.is_match(extra) {
                Ok(extra.to_string())
            } else {
                Err(format!("Invalid extra '{}'", extra))
            }
        })
        .collect()
}

fn parse_specifiers(constraints: &str) -> Result<Vec<String>, String> {
    let constraints = match constraints.strip_prefix('(') {
        Some(inner) => inner
            .strip_suffix(')')
            .ok_or_else(|| "Unclosed parenthesis in version constraints".to_string())?
            .trim(),
        None => constraints,
    };

    constraints
        .split(',')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return Err("Empty version constraint".to_string());
            }

            let captures = SPECIFIER_RE
                .captures(part)
                .ok_or_else(|| format!("Invalid version constraint '{}'", part))?;
            let op = &captures[1];
            let version = &captures[2];

            if !version.chars().any(|c| c.is_ascii_digit()) {
                return Err(format!("Invalid version '{}' in '{}'", version, part));
            }
            if version.contains('*') && !(matches!(op, "==" | "!=") && version.ends_with(".*")) {
                return Err(format!("Wildcards are only allowed as '==X.*' or '!=X.*': '{}'", part));
            }

            Ok(format!("{}{}", op, version))
        })
        .collect()
}

fn parse_markers(markers: &str) -> Result<String, String> {
    let markers = markers.trim();
    if markers.is_empty() {
        Err("Empty environment marker after ';'".to_string())
    } else {
        Ok(markers.to_string())
    }
}

/// Splits the text after `@` into the URL and optional markers. The URL ends at the first
/// whitespace; anything after it must be a `;` marker clause.
fn split_url_reference(reference: &str) -> Result<(String, Option<String>), String> {
    let reference = reference.trim_start();
    let end = reference
        .find(char::is_whitespace)
        .unwrap_or(reference.len());
    let url = &reference[..end];
    if url.is_empty() {
        return Err("Missing URL after '@'".to_string());
    }

    let rest = reference[end..].trim();
    let markers = if rest.is_empty() {
        None
    } else if let Some(markers) = rest.strip_prefix(';') {
        Some(parse_markers(markers)?)
    } else {
        return Err(format!("Unexpected text after URL: '{}'", rest));
    };

    Ok((url.to_string(), markers))
}

fn parse_bare_url(input: &str) -> Result<DependencySpec, String> {
    let (url, markers) = split_url_reference(input)?;
    let name = name_from_url(&url).ok_or_else(|| {
        format!(
            "Cannot determine the package name of '{}'; use 'name @ url' or add '#egg=name'",
            url
        )
    })?;

    let mut spec = DependencySpec::new(name);
    spec.url = Some(url);
    spec.markers = markers;
    Ok(spec)
}

/// Reads a package name from an `#egg=` fragment or from a wheel/sdist filename
pub fn name_from_url(url: &str) -> Option<String> {
    if let Some((_, fragment)) = url.split_once('#') {
        for pair in fragment.split('&') {
            if let Some(egg) = pair.strip_prefix("egg=") {
                let egg = egg.split('[').next().unwrap_or(egg);
                if is_valid_name(egg) {
                    return Some(egg.to_string());
                }
            }
        }
    }

    let path = url.split(['#', '?']).next().unwrap_or(url);
    let file_name = path.trim_end_matches('/').rsplit('/').next()?;

    let name = if let Some(stem) = file_name.strip_suffix(".whl") {
        stem.split('-').next()?
    } else {
        let stem = [".tar.gz", ".tar.bz2", ".zip", ".tgz"]
            .iter()
            .find_map(|ext| file_name.strip_suffix(ext))?;
        match stem.rsplit_once('-') {
            Some((name, version)) if version.starts_with(|c: char| c.is_ascii_digit()) => name,
            _ => stem,
        }
    };

    is_valid_name(name).then(|| name.to_string())
}

/// Whether the whole string is a valid distribution name
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE
        .find(name)
        .is_some_and(|m| m.end() == name.len() && !normalize_name(name).is_empty())
}
