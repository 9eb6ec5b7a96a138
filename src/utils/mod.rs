pub mod build_system;
pub mod file_ops;
pub mod toml;

pub use build_system::BuildBackend;
pub use file_ops::{backup_path, create_backup, write_atomic};
