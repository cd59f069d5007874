//! # scientia-core
//!
//! Core library for the scientia documentation generator.
//!
//! This crate reads documentation modules, converts their Markdown documents,
//! records cross-references between them and checks that every reference
//! resolves before anything is rendered.

pub mod builder;
pub mod check;
pub mod config;
pub mod fingerprint;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod namespace;
pub mod navigation;
pub mod registry;
pub mod store;
pub mod tree;

pub use builder::{BuildError, Collected, Site, SiteBuilder};
pub use check::{ConsistencyReport, Violation};
pub use config::{Config, DirectoryConfig, ModuleConfig};
pub use fingerprint::BuildFingerprint;
pub use markdown::{ContentConverter, ConvertError};
pub use models::{Breadcrumb, DocType, Document, DocumentMeta};
pub use namespace::{resolve_target, Remapping};
pub use navigation::{EntryKind, IndexEntry, Navigation};
pub use registry::ReferenceRegistry;
pub use store::{DocumentStore, DocumentationModule, StoreError};
pub use tree::TreeNode;

pub use scientia_types::{DocId, Namespace, QualifiedId};
