mod grammar;
mod lines;

pub use grammar::{
    is_local_path, is_url, is_valid_name, name_from_url, parse_requirement,
    requirement_sort_key,
};
pub use lines::{LogicalLine, LogicalLines, RequirementEntry, RequirementsParser};
