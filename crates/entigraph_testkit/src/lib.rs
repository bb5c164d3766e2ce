//! # EntiGraph Testkit
//!
//! Test utilities for EntiGraph.
//!
//! This crate provides:
//! - Entity and model fixtures (`Person`, `ScriptedModel`)
//! - Property-based test generators using proptest
//! - Concurrent activation and mutation stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entigraph_testkit::prelude::*;
//!
//! #[test]
//! fn rename_is_undoable() {
//!     let (model, people) = model_with_people(&sample_people());
//!     model.transaction(|_| people[0].set_name("Ada L.")).unwrap();
//!     model.undo().unwrap();
//!     assert_eq!(people[0].name().unwrap(), "Ada");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
