//! Askama template definitions.

use askama::Template;

/// Site-wide values shown on every page
#[derive(Debug, Clone)]
pub struct PageContext {
    pub site_title: String,
    pub footer: String,
    pub google_analytics: Option<String>,
    pub fingerprint: String,
    /// UTC build time
    pub created: String,
}

/// A link to a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub href: String,
    pub title: String,
}

/// One step of a document's breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    /// Only set when a document exists at that level
    pub href: Option<String>,
}

/// A module on the site front page
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub href: String,
    pub name: String,
    pub description: String,
    pub documents: usize,
}

/// One row of a module index
#[derive(Debug, Clone)]
pub struct IndexRow {
    pub title: String,
    pub href: Option<String>,
    pub depth: usize,
    pub is_dir: bool,
    pub description: Option<String>,
    pub group: Option<String>,
}

/// Front page listing every module in configured order
#[derive(Template)]
#[template(path = "modules.html")]
pub struct ModulesTemplate {
    pub page: PageContext,
    /// Prefix from this page to the site root
    pub root: String,
    pub title: String,
    pub modules: Vec<ModuleEntry>,
}

/// Tree index of one module
#[derive(Template)]
#[template(path = "module_index.html")]
pub struct ModuleIndexTemplate {
    pub page: PageContext,
    pub root: String,
    pub title: String,
    pub description: String,
    pub landing_page: Option<LinkEntry>,
    pub rows: Vec<IndexRow>,
}

/// Document page
#[derive(Template)]
#[template(path = "document.html")]
pub struct DocumentTemplate {
    pub page: PageContext,
    pub root: String,
    pub module: LinkEntry,
    pub title: String,
    pub subtitle: Option<String>,
    pub summary: Option<String>,
    pub doc_type: String,
    pub authors: Vec<String>,
    pub date: Option<String>,
    pub copyright: Option<String>,
    pub tags: Vec<LinkEntry>,
    pub breadcrumbs: Vec<Crumb>,
    pub content: String,
    pub seealso: Vec<LinkEntry>,
    pub backlinks: Vec<LinkEntry>,
    pub knowl_sources: Vec<LinkEntry>,
    pub prev: Option<LinkEntry>,
    pub next: Option<LinkEntry>,
}

/// Plain list of links, used for hashtag pages
#[derive(Template)]
#[template(path = "list.html")]
pub struct ListTemplate {
    pub page: PageContext,
    pub root: String,
    pub title: String,
    pub links: Vec<LinkEntry>,
}
