//! Groundwork - idempotent environment bootstrap for MCP tool servers.
//!
//! Groundwork replaces the pair of shell scripts that used to prepare this
//! workspace's development environment: it probes for required tools,
//! installs what is missing, clones and builds the opendata MCP server,
//! installs the github MCP server as a package, and renders MCP client
//! configs from embedded templates. Every step is idempotent and every
//! failure is a warning — the run always ends Ready and exits 0.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`error`] - Error types and result aliases
//! - [`plan`] - The static bootstrap plan and workspace layout
//! - [`probe`] - Capability probing for required tools
//! - [`repo`] - Source checkout fetching and building
//! - [`runner`] - Step orchestration and the run report
//! - [`secrets`] - Secret sourcing and output masking
//! - [`shell`] - Subprocess execution with timeouts
//! - [`steps`] - The step and report data model
//! - [`template`] - Template-driven config rendering
//! - [`tools`] - Tool specs and installer steps
//!
//! # Example
//!
//! ```
//! use groundwork::template::{render_str, Mapping};
//!
//! let mapping = vec![Mapping::new("__A__", "x")];
//! let out = render_str("token=__A__ other=__B__", &mapping);
//! assert_eq!(out, "token=x other=__B__");
//! ```

pub mod cli;
pub mod error;
pub mod plan;
pub mod probe;
pub mod repo;
pub mod runner;
pub mod secrets;
pub mod shell;
pub mod steps;
pub mod template;
pub mod tools;

pub use error::{GroundworkError, Result};
