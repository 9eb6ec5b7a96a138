//! Convert pip-style requirements files into `pyproject.toml` dependencies.

pub mod cli;
pub mod converters;
pub mod error;
pub mod manifest;
pub mod models;
pub mod parser;
pub mod utils;
