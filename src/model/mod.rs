//! Core data types for applications, update decisions, and check reports.
//!
//! - [`ApplicationDescriptor`] - An installed application to check
//! - [`UpdateDecision`] - The outcome of resolving one application
//! - [`CheckReport`] - Decisions for a whole batch of applications
//!
//! # Example
//!
//! ```
//! use upwatch::{ApplicationDescriptor, UpdateDecision};
//!
//! let app = ApplicationDescriptor::new("Firefox", "Mozilla", "100.0", "/usr/bin/firefox");
//! let decision = UpdateDecision::skipped(&app.version);
//!
//! assert!(!decision.has_update);
//! ```

mod application;
mod decision;
mod report;

pub use application::*;
pub use decision::*;
pub use report::*;
