//! # scientia-render
//!
//! HTML rendering for scientia sites.
//!
//! Templates are compiled with Askama; [`render_site`] writes a checked
//! [`scientia_core::Site`] to disk together with the embedded static assets.

pub mod output;
pub mod templates;

pub use output::{render_site, RenderError, RenderStats, SiteRenderer};
pub use templates::{
    Crumb, DocumentTemplate, IndexRow, LinkEntry, ListTemplate, ModuleEntry, ModuleIndexTemplate,
    ModulesTemplate, PageContext,
};
