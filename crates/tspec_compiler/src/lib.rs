//! tspec_compiler: Compiler orchestration.
//!
//! Loads a program through a [`CompilerHost`], then parses, binds and
//! checks every source file into one type graph.

pub mod host;
pub mod options;
mod program;

pub use host::{CompilerHost, FileStat, HostError, LogLevel, NodeHost, VirtualFsHost};
pub use options::{interpolate_path, CompilerOptions, EmitterOptions, OptionsError, PathVariables};
pub use program::{compile, Program};
