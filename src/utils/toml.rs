use crate::error::{Error, Result};
use std::{fs, path::Path};

use toml_edit::{Array, DocumentMut, Item, Table, Value};

/// Reads a TOML file and returns its content as a DocumentMut.
pub fn read_toml(path: &Path) -> Result<DocumentMut> {
    let content = fs::read_to_string(path).map_err(|e| Error::FileOperation {
        path: path.to_path_buf(),
        message: format!("Failed to read TOML file: {}", e),
    })?;

    parse_toml(path, &content)
}

/// Parses TOML text read from `path`, reporting syntax errors against that file.
pub fn parse_toml(path: &Path, content: &str) -> Result<DocumentMut> {
    content
        .parse::<DocumentMut>()
        .map_err(|e| Error::ManifestFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Builds a one-entry-per-line array with a trailing comma, the layout used for
/// dependency lists.
pub fn dependency_array<I>(values: I) -> Array
where
    I: IntoIterator<Item = Value>,
{
    let mut array = Array::new();
    for mut value in values {
        value.decor_mut().set_prefix("\n    ");
        value.decor_mut().set_suffix("");
        array.push_formatted(value);
    }

    if !array.is_empty() {
        array.set_trailing_comma(true);
        array.set_trailing("\n");
    }

    array
}

/// Defines the expected order of fields within the [project] section
const PROJECT_FIELD_ORDER: &[&str] = &[
    "name",
    "version",
    "description",
    "authors",
    "readme",
    "requires-python",
    "dependencies",
    "classifiers",
    "optional-dependencies",
    "scripts",
    "urls",
];

/// Orders fields within a table according to a predefined order
fn order_table_fields(table: &mut Table, field_order: &[&str]) -> Table {
    let mut ordered = Table::new();
    ordered.set_implicit(table.is_implicit());

    // First add fields in the specified order
    for &field in field_order {
        if let Some(value) = table.remove(field) {
            ordered.insert(field, value);
        }
    }

    // Then add any remaining fields that weren't in the order list
    for (key, value) in table.iter() {
        if !field_order.contains(&key) {
            ordered.insert(key, value.clone());
        }
    }

    ordered
}

/// Puts the fields of the [project] section into their conventional order.
pub fn order_project_fields(doc: &mut DocumentMut) {
    if let Some(Item::Table(project_table)) = doc.get_mut("project") {
        let ordered_project = order_table_fields(project_table, PROJECT_FIELD_ORDER);
        doc.insert("project", Item::Table(ordered_project));
    }
}
