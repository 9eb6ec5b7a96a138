use super::grammar::{is_local_path, name_from_url, parse_requirement};
use crate::error::{Error, Result};
use crate::models::DependencySpec;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::Lines;
use std::sync::LazyLock;

static SETUP_PY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name\s*=\s*["']([^"']+)["']"#).unwrap());

/// A requirement line after continuations are joined and comments stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the first physical line
    pub number: usize,
    pub text: String,
}

/// Iterates over the non-blank logical lines of a requirements file
pub struct LogicalLines<'a> {
    lines: std::iter::Enumerate<Lines<'a>>,
}

impl<'a> LogicalLines<'a> {
    pub fn new(content: &'a str) -> Self {
        // Editors on Windows often save a leading byte-order mark
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        Self {
            lines: content.lines().enumerate(),
        }
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        loop {
            let (index, first) = self.lines.next()?;

            // Full-line comments never continue onto the next line
            if first.trim_start().starts_with('#') {
                continue;
            }

            let mut joined = first.to_string();
            while joined.ends_with('\\') {
                joined.pop();
                match self.lines.next() {
                    Some((_, next)) => joined.push_str(next),
                    None => break,
                }
            }

            let text = strip_comment(&joined).trim();
            if text.is_empty() {
                continue;
            }

            return Some(LogicalLine {
                number: index + 1,
                text: text.to_string(),
            });
        }
    }
}

/// Removes a `#` comment that starts the line or follows whitespace
fn strip_comment(line: &str) -> &str {
    let mut previous_is_space = true;
    for (index, c) in line.char_indices() {
        if c == '#' && previous_is_space {
            return &line[..index];
        }
        previous_is_space = c.is_whitespace();
    }
    line
}

/// One meaningful line of a requirements file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementEntry {
    /// A requirement to convert
    Dependency(DependencySpec),

    /// A `-r`/`--requirement` reference to another file, resolved against the including file
    Include(PathBuf),
}

/// Lazily parses requirements text into dependencies, one per requirement line.
///
/// Option lines (`-i`, `--extra-index-url`, `-c`, ...) are skipped. `-r` includes are
/// skipped by the iterator; [`RequirementsParser::next_entry`] surfaces them to callers
/// that follow includes.
pub struct RequirementsParser<'a> {
    source: PathBuf,
    base_dir: Option<PathBuf>,
    lines: LogicalLines<'a>,
}

impl<'a> RequirementsParser<'a> {
    /// Parser over in-memory text; local paths resolve against the working directory
    pub fn new(content: &'a str) -> Self {
        Self {
            source: PathBuf::from("<string>"),
            base_dir: None,
            lines: LogicalLines::new(content),
        }
    }

    /// Parser over the content of `path`; errors name the file and local paths
    /// resolve against its directory
    pub fn with_source(content: &'a str, path: &Path) -> Self {
        Self {
            source: path.to_path_buf(),
            base_dir: path.parent().map(Path::to_path_buf),
            lines: LogicalLines::new(content),
        }
    }

    /// Returns the next dependency or include, skipping every other option line
    pub fn next_entry(&mut self) -> Option<Result<RequirementEntry>> {
        while let Some(line) = self.lines.next() {
            match self.parse_line(&line) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(message) => {
                    return Some(Err(Error::RequirementParse {
                        path: self.source.clone(),
                        line: line.number,
                        content: line.text,
                        message,
                    }));
                }
            }
        }
        None
    }

    fn parse_line(&self, line: &LogicalLine) -> std::result::Result<Option<RequirementEntry>, String> {
        let text = line.text.as_str();

        if let Some(target) = option_value(text, "-e", "--editable") {
            let mut spec = self.parse_target(strip_requirement_options(target))?;
            spec.editable = true;
            return Ok(Some(RequirementEntry::Dependency(spec)));
        }

        if let Some(target) = option_value(text, "-r", "--requirement") {
            if target.is_empty() {
                return Err("Missing file after -r/--requirement".to_string());
            }
            return Ok(Some(RequirementEntry::Include(self.resolve(target))));
        }

        if text.starts_with('-') {
            debug!(
                "Skipping option on line {} of {}: {}",
                line.number,
                self.source.display(),
                text
            );
            return Ok(None);
        }

        let spec = self.parse_target(strip_requirement_options(text))?;
        Ok(Some(RequirementEntry::Dependency(spec)))
    }

    fn parse_target(&self, target: &str) -> std::result::Result<DependencySpec, String> {
        let target = target.trim();
        if target.is_empty() {
            return Err("Missing requirement".to_string());
        }

        if is_local_path(target) {
            self.parse_local_path(target)
        } else {
            parse_requirement(target)
        }
    }

    fn parse_local_path(&self, target: &str) -> std::result::Result<DependencySpec, String> {
        let (path_text, egg_name) = match target.split_once('#') {
            Some((path, _)) => (path, name_from_url(target)),
            None => (target, None),
        };

        let local = path_text
            .strip_prefix("file://")
            .or_else(|| path_text.strip_prefix("file:"))
            .unwrap_or(path_text);

        let name = match egg_name {
            Some(name) => name,
            None => name_from_local_path(&self.resolve(local)).ok_or_else(|| {
                format!("Cannot determine the package name of local path '{}'", path_text)
            })?,
        };

        let mut spec = DependencySpec::new(name);
        spec.path = Some(path_text.to_string());
        Ok(spec)
    }

    fn resolve(&self, target: &str) -> PathBuf {
        let path = Path::new(target);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Iterator for RequirementsParser<'_> {
    type Item = Result<DependencySpec>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_entry()? {
                Ok(RequirementEntry::Dependency(spec)) => return Some(Ok(spec)),
                Ok(RequirementEntry::Include(path)) => {
                    debug!("Not following include of {}", path.display());
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Returns the value of a short/long option line such as `-r file`, `-rfile`,
/// `--requirement file` or `--requirement=file`
fn option_value<'t>(text: &'t str, short: &str, long: &str) -> Option<&'t str> {
    if let Some(rest) = text.strip_prefix(long) {
        if rest.is_empty() {
            return Some("");
        }
        if let Some(value) = rest.strip_prefix('=') {
            return Some(value.trim());
        }
        if rest.starts_with(char::is_whitespace) {
            return Some(rest.trim());
        }
        return None;
    }

    if text.starts_with("--") {
        return None;
    }

    text.strip_prefix(short).map(|rest| rest.trim_start_matches('=').trim())
}

/// Drops per-requirement pip options such as `--hash=sha256:...`
fn strip_requirement_options(text: &str) -> &str {
    let bytes = text.as_bytes();
    for (index, window) in bytes.windows(3).enumerate() {
        if window[0].is_ascii_whitespace() && window[1] == b'-' && window[2] == b'-' {
            return text[..index].trim_end();
        }
    }
    text
}

/// Reads the distribution name of a local project: `[project].name` or
/// `[tool.poetry].name` from pyproject.toml, the `name=` argument of setup.py,
/// the wheel filename, or finally the directory name
fn name_from_local_path(path: &Path) -> Option<String> {
    let pyproject = path.join("pyproject.toml");
    if let Ok(content) = fs::read_to_string(&pyproject) {
        if let Ok(table) = content.parse::<toml::Table>() {
            let name = table
                .get("project")
                .and_then(|p| p.get("name"))
                .or_else(|| {
                    table
                        .get("tool")
                        .and_then(|t| t.get("poetry"))
                        .and_then(|p| p.get("name"))
                })
                .and_then(|n| n.as_str());
            if let Some(name) = name {
                debug!("Found name '{}' in {}", name, pyproject.display());
                return Some(name.to_string());
            }
        }
    }

    let setup_py = path.join("setup.py");
    if let Ok(content) = fs::read_to_string(&setup_py) {
        if let Some(captures) = SETUP_PY_NAME_RE.captures(&content) {
            debug!("Found name '{}' in {}", &captures[1], setup_py.display());
            return Some(captures[1].to_string());
        }
    }

    let file_name = path.file_name()?.to_str()?;
    if let Some(stem) = file_name.strip_suffix(".whl") {
        return stem.split('-').next().map(str::to_string);
    }

    let name = [".tar.gz", ".zip"]
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .map(|stem| match stem.rsplit_once('-') {
            Some((name, version)) if version.starts_with(|c: char| c.is_ascii_digit()) => name,
            _ => stem,
        })
        .unwrap_or(file_name);

    (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
}
