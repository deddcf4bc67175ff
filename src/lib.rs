//! capcheck - detects accidental captures of callback-shadowed receivers in
//! Go code.
//!
//! A higher-order function often hands its callback a fresh, scoped value (a
//! transaction handle, a sub-context) through a parameter. A copy-paste or a
//! refactor can leave the body calling a method on the captured outer
//! variable instead of on the parameter - code that compiles fine but
//! operates on the wrong receiver. capcheck walks every callback passed as a
//! function-literal argument and reports method calls whose receiver is an
//! outer variable that matches a parameter by interface satisfaction, by
//! exact concrete type, or by the enclosing call's receiver type.
//!
//! # Architecture
//!
//! - [`ast`]: tree-sitter traversal helpers (pre-order walk with early stop)
//! - [`chain`]: selector-chain and type-chain resolution
//! - [`oracle`]: the type-oracle boundary ([`oracle::TypeOracle`])
//! - [`index`]: the shipped oracle, a package-scoped type index
//! - [`params`]: callback parameter classification
//! - [`analyzer`]: the capture matcher and its findings
//! - [`config`]: allow/ignore lists and log level
//! - [`driver`]: file discovery, parsing, parallel per-file analysis
//!
//! # Quick start
//!
//! ```no_run
//! use capcheck::{analyze_paths, Config};
//!
//! let config = Config::default().with_ignore_interfaces(vec!["Logger".into()]);
//! let findings = analyze_paths(&["./pkg".into()], &config)?;
//! for finding in &findings {
//!     println!("{}: {}", finding.location, finding.message);
//! }
//! # Ok::<(), capcheck::CapError>(())
//! ```

pub mod analyzer;
pub mod ast;
pub mod chain;
pub mod config;
pub mod driver;
pub mod error;
pub mod index;
pub mod oracle;
pub mod params;

pub use analyzer::{Finding, FindingKind, Location};
pub use config::{Config, LogLevel};
pub use driver::analyze_paths;
pub use error::{CapError, ResolveError, Result};
pub use index::PackageIndex;
pub use oracle::{Selection, TypeOracle, TypeRef};
