//! nbake-lib: Core logic for the nbake build orchestrator
//!
//! This crate sequences the external tools of a .NET-style build and does the
//! file work between them:
//! - `packages`: NuGet download, restore and hint-path validation
//! - `descriptor`: project descriptor editing and the derived x86 descriptor
//! - `build`: native and cross-platform compiler invocation
//! - `test_runner`: xunit console runs with per-assembly reports
//! - `pack`: flattened zip archives of build output
//! - `task` / `orchestrator`: the named task graph and its execution

pub mod build;
pub mod config;
pub mod consts;
pub mod descriptor;
pub mod git;
pub mod orchestrator;
pub mod pack;
pub mod packages;
pub mod platform;
pub mod process;
pub mod task;
pub mod test_runner;
pub mod util;
pub mod version;
