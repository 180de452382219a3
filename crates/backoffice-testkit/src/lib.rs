//! Backoffice Testing Infrastructure
//!
//! In-memory repositories, document and document type fixtures, and plugin
//! modules that record what ran.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! backoffice-testkit = { path = "../backoffice-testkit" }
//! ```
//!
//! ```rust,ignore
//! use backoffice_testkit::*;
//!
//! let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
//! let types = InMemoryDocumentTypeRepository::with_types(diamond_types());
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod modules;
pub mod repositories;

pub use fixtures::*;
pub use modules::*;
pub use repositories::*;
