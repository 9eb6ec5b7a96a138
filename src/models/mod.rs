pub mod dependency;
pub mod options;
pub mod project;

pub use dependency::{
    DependencyGroup, DependencySpec, DependencyType, SourcedDependency, normalize_name,
};
pub use options::{
    ConversionOptions, GroupNames, MAIN_GROUP, MergeMode, OutputFormat, check_group_name,
};
pub use project::{BuildSystemConfig, ProjectConfig, ProjectMetadata, PyProject};
