//! Writes a checked [`Site`] to an output directory.
//!
//! The output directory is wiped first, so a failed render never leaves a
//! mix of old and new pages behind.

use crate::templates::{
    Crumb, DocumentTemplate, IndexRow, LinkEntry, ListTemplate, ModuleEntry, ModuleIndexTemplate,
    ModulesTemplate, PageContext,
};
use askama::Template;
use chrono::{DateTime, Utc};
use include_dir::{include_dir, Dir, DirEntry};
use scientia_core::{
    Document, DocumentStore, DocumentationModule, EntryKind, IndexEntry, QualifiedId, Site,
};
use scientia_types::DocId;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CSS and the knowl loader, copied to `static/`
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to serialize graph: {0}")]
    Json(#[from] serde_json::Error),

    #[error("refusing to wipe {path}: it contains the source directory")]
    UnsafeOutput { path: PathBuf },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What one render produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub modules: usize,
    pub documents: usize,
    pub hashtags: usize,
}

/// Render `site` into `output_dir` with the current time as creation date
pub fn render_site(site: &Site, output_dir: &Path) -> Result<RenderStats, RenderError> {
    SiteRenderer::new(site).render(output_dir)
}

pub struct SiteRenderer<'s> {
    site: &'s Site,
    page: PageContext,
}

impl<'s> SiteRenderer<'s> {
    pub fn new(site: &'s Site) -> Self {
        let config = site.config();
        SiteRenderer {
            site,
            page: PageContext {
                site_title: config.title.clone(),
                footer: config.footer.clone(),
                google_analytics: config.google_analytics.clone(),
                fingerprint: site.fingerprint().to_string(),
                created: format_created(Utc::now()),
            },
        }
    }

    /// Override the creation date shown on every page
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.page.created = format_created(created);
        self
    }

    pub fn render(&self, output_dir: &Path) -> Result<RenderStats, RenderError> {
        tracing::info!("rendering site into {}", output_dir.display());
        self.prepare_output(output_dir)?;

        let store = self.site.store();
        let mut stats = RenderStats::default();

        self.render_front_page(output_dir)?;
        for module in store.modules() {
            let module_dir = output_dir.join(module.namespace().as_str());
            self.render_module_index(module, &module_dir)?;
            for (docid, document) in module.documents() {
                self.render_document(module, docid, document, &module_dir)?;
                stats.documents += 1;
            }
            stats.modules += 1;
            tracing::debug!("rendered module {}", module.namespace());
        }

        stats.hashtags = self.render_hashtags(&output_dir.join("hashtag"))?;
        self.write_graph(output_dir)?;
        extract_static(&output_dir.join("static"))?;

        tracing::info!(
            "rendered {} documents in {} modules, {} hashtags",
            stats.documents,
            stats.modules,
            stats.hashtags
        );
        Ok(stats)
    }

    fn prepare_output(&self, output_dir: &Path) -> Result<(), RenderError> {
        if output_dir.exists() {
            let output = output_dir.canonicalize().map_err(io_error(output_dir))?;
            let source_dir = self.site.config().source_dir();
            let contains_source = source_dir
                .canonicalize()
                .map_or(false, |source| source.starts_with(&output));
            if contains_source {
                return Err(RenderError::UnsafeOutput {
                    path: output_dir.to_path_buf(),
                });
            }
            fs::remove_dir_all(output_dir).map_err(io_error(output_dir))?;
        }
        fs::create_dir_all(output_dir).map_err(io_error(output_dir))
    }

    fn render_front_page(&self, output_dir: &Path) -> Result<(), RenderError> {
        let modules = self
            .site
            .store()
            .modules()
            .map(|module| ModuleEntry {
                href: format!("{}/index.html", module.namespace()),
                name: module.name().to_string(),
                description: module.description().to_string(),
                documents: module.len(),
            })
            .collect();

        let template = ModulesTemplate {
            page: self.page.clone(),
            root: String::new(),
            title: self.page.site_title.clone(),
            modules,
        };
        write_page(&output_dir.join("index.html"), &template)
    }

    fn render_module_index(
        &self,
        module: &DocumentationModule,
        module_dir: &Path,
    ) -> Result<(), RenderError> {
        let landing_page = module
            .landing_page()
            .and_then(|page| DocId::new(page).ok())
            .and_then(|docid| module.get(&docid))
            .map(|document| LinkEntry {
                href: format!("{}.html", document.docid()),
                title: document.title(),
            });

        let rows = self
            .site
            .navigation()
            .index(module.namespace())
            .iter()
            .map(index_row)
            .collect();

        let template = ModuleIndexTemplate {
            page: self.page.clone(),
            root: "../".to_string(),
            title: module.name().to_string(),
            description: module.description().to_string(),
            landing_page,
            rows,
        };
        write_page(&module_dir.join("index.html"), &template)
    }

    fn render_document(
        &self,
        module: &DocumentationModule,
        docid: &DocId,
        document: &Document,
        module_dir: &Path,
    ) -> Result<(), RenderError> {
        let store = self.site.store();
        let registry = self.site.registry();
        let id = document.id();
        let meta = document.meta();

        let crumbs = module.breadcrumbs(docid);
        let last = crumbs.len().saturating_sub(1);
        let breadcrumbs = crumbs
            .into_iter()
            .enumerate()
            .map(|(level, crumb)| Crumb {
                href: (level < last && module.contains_str(&crumb.path))
                    .then(|| format!("{}.html", crumb.path)),
                label: crumb.label,
            })
            .collect();

        let sibling = |docid: Option<&DocId>| {
            docid.and_then(|d| module.get(d)).map(|d| LinkEntry {
                href: format!("{}.html", d.docid()),
                title: d.title(),
            })
        };

        let template = DocumentTemplate {
            page: self.page.clone(),
            root: "../".to_string(),
            module: LinkEntry {
                href: "index.html".to_string(),
                title: module.name().to_string(),
            },
            title: document.title(),
            subtitle: meta.and_then(|m| m.subtitle.clone()),
            summary: meta.and_then(|m| m.r#abstract.clone()),
            doc_type: meta.map(|m| m.doc_type).unwrap_or_default().to_string(),
            authors: meta.map(|m| m.authors.clone()).unwrap_or_default(),
            date: meta.and_then(|m| m.date.clone()),
            copyright: meta.and_then(|m| m.copyright.clone()),
            tags: meta
                .map(|m| m.tags.iter().map(|tag| tag_link(tag)).collect())
                .unwrap_or_default(),
            breadcrumbs,
            content: document.output().unwrap_or_default().to_string(),
            seealso: meta
                .map(|m| m.seealso.iter().map(|target| doc_link(store, target)).collect())
                .unwrap_or_default(),
            backlinks: registry
                .backlinks_of(id)
                .map(|source| doc_link(store, source))
                .collect(),
            knowl_sources: registry
                .knowls_of(id)
                .map(|source| doc_link(store, source))
                .collect(),
            prev: sibling(document.prev()),
            next: sibling(document.next()),
        };

        write_page(&module_dir.join(format!("{docid}.html")), &template)?;
        tracing::debug!("rendered {id}");
        Ok(())
    }

    /// Tag pages for inline hashtags and front-matter tags alike
    fn render_hashtags(&self, hashtag_dir: &Path) -> Result<usize, RenderError> {
        let store = self.site.store();
        let tags = collect_tags(self.site);

        let links = tags
            .iter()
            .map(|(slug, documents)| LinkEntry {
                href: format!("{slug}.html"),
                title: format!("#{slug} ({})", documents.len()),
            })
            .collect();
        let index = ListTemplate {
            page: self.page.clone(),
            root: "../".to_string(),
            title: "Hashtags".to_string(),
            links,
        };
        write_page(&hashtag_dir.join("index.html"), &index)?;

        for (slug, documents) in &tags {
            let template = ListTemplate {
                page: self.page.clone(),
                root: "../".to_string(),
                title: format!("Hashtag #{slug}"),
                links: documents.iter().map(|id| doc_link(store, id)).collect(),
            };
            write_page(&hashtag_dir.join(format!("{slug}.html")), &template)?;
        }
        Ok(tags.len())
    }

    fn write_graph(&self, output_dir: &Path) -> Result<(), RenderError> {
        let store = self.site.store();
        let registry = self.site.registry();

        let nodes: Vec<_> = store
            .modules()
            .flat_map(|module| module.documents())
            .map(|(_, document)| {
                json!({
                    "id": document.id().to_string(),
                    "title": document.title(),
                    "type": document.meta().map(|m| m.doc_type.as_str()),
                    "href": document.id().html_path(),
                })
            })
            .collect();

        let edges = |index: &BTreeMap<QualifiedId, BTreeSet<QualifiedId>>| {
            index
                .iter()
                .flat_map(|(target, sources)| {
                    sources.iter().map(move |source| {
                        json!({
                            "source": source.to_string(),
                            "target": target.to_string(),
                        })
                    })
                })
                .collect::<Vec<_>>()
        };

        let hashtags: BTreeMap<&str, Vec<String>> = registry
            .hashtags()
            .iter()
            .map(|(tag, ids)| (tag.as_str(), ids.iter().map(ToString::to_string).collect()))
            .collect();

        let graph = json!({
            "fingerprint": self.site.fingerprint(),
            "nodes": nodes,
            "links": edges(registry.backlinks()),
            "knowls": edges(registry.knowls()),
            "hashtags": hashtags,
        });

        let path = output_dir.join("graph.json");
        let json = serde_json::to_string_pretty(&graph)?;
        fs::write(&path, json).map_err(io_error(&path))?;
        tracing::info!("generated graph.json");
        Ok(())
    }
}

fn format_created(created: DateTime<Utc>) -> String {
    created.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn index_row(entry: &IndexEntry) -> IndexRow {
    IndexRow {
        title: entry.title.clone(),
        href: entry.href.clone(),
        depth: entry.depth,
        is_dir: entry.kind == EntryKind::Dir,
        description: entry.description.clone(),
        group: entry.group.clone(),
    }
}

/// Link from a document page to any document
fn doc_link(store: &DocumentStore, id: &QualifiedId) -> LinkEntry {
    LinkEntry {
        href: format!("../{}", id.html_path()),
        title: store
            .get(id)
            .map(Document::title)
            .unwrap_or_else(|| id.to_string()),
    }
}

/// File name of a tag page; tags already follow the hashtag grammar
fn tag_slug(tag: &str) -> String {
    tag.to_lowercase()
}

fn tag_link(tag: &str) -> LinkEntry {
    LinkEntry {
        href: format!("../hashtag/{}.html", tag_slug(tag)),
        title: tag.to_string(),
    }
}

fn collect_tags(site: &Site) -> BTreeMap<String, BTreeSet<QualifiedId>> {
    let mut tags: BTreeMap<String, BTreeSet<QualifiedId>> = site
        .registry()
        .hashtags()
        .iter()
        .map(|(tag, ids)| (tag_slug(tag), ids.clone()))
        .collect();

    for module in site.store().modules() {
        for (_, document) in module.documents() {
            for tag in document.meta().map(|m| m.tags.as_slice()).unwrap_or(&[]) {
                tags.entry(tag_slug(tag))
                    .or_default()
                    .insert(document.id().clone());
            }
        }
    }
    tags
}

fn write_page(path: &Path, template: &impl Template) -> Result<(), RenderError> {
    let html = template.render()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(path, html).map_err(io_error(path))
}

fn extract_static(dest: &Path) -> Result<(), RenderError> {
    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, dest)?;
    }
    Ok(())
}

fn extract_entry(entry: &DirEntry<'_>, dest: &Path) -> Result<(), RenderError> {
    match entry {
        DirEntry::Dir(dir) => {
            for child in dir.entries() {
                extract_entry(child, dest)?;
            }
        }
        DirEntry::File(file) => {
            let target = dest.join(file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            fs::write(&target, file.contents()).map_err(io_error(&target))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scientia_core::{Config, SiteBuilder};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build_site(root: &Path) -> Site {
        write(
            root,
            "src/guide/config.yaml",
            "name: Guide\ndescription: The guide\nlanding_page: intro\n",
        );
        write(
            root,
            "src/guide/intro.md",
            "---\ntitle: Intro\ntags: [Getting-Started]\n---\nSee link[overview] and knowl[install.linux]. #Rust\n",
        );
        write(
            root,
            "src/guide/overview.md",
            "---\ntitle: Overview\nseealso: [intro]\n---\nOverview.\n",
        );
        write(root, "src/guide/install/config.yaml", "title: Installation\n");
        write(
            root,
            "src/guide/install/linux.md",
            "---\ntitle: Linux\n---\nUse the package manager.\n",
        );

        let config = Config::from_yaml_str("title: Test Site\nfooter: Footer\nmodules: [guide]\n")
            .unwrap()
            .with_source_dir(root.join("src"));
        SiteBuilder::new(config).build().unwrap()
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn test_render_writes_every_page() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());
        let out = tmp.path().join("out");

        let stats = render_site(&site, &out).unwrap();
        assert_eq!(
            stats,
            RenderStats {
                modules: 1,
                documents: 3,
                hashtags: 2,
            }
        );

        for page in [
            "index.html",
            "guide/index.html",
            "guide/intro.html",
            "guide/overview.html",
            "guide/install.linux.html",
            "hashtag/index.html",
            "hashtag/rust.html",
            "hashtag/getting-started.html",
            "graph.json",
            "static/scientia.css",
            "static/scientia.js",
        ] {
            assert!(out.join(page).is_file(), "missing {page}");
        }
    }

    #[test]
    fn test_document_page_references() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());
        let out = tmp.path().join("out");
        render_site(&site, &out).unwrap();

        let overview = read(&out, "guide/overview.html");
        assert!(overview.contains("Backlinks"));
        assert!(overview.contains(r#"href="../guide/intro.html""#));
        assert!(overview.contains("See also"));
        assert!(overview.contains(site.fingerprint()));

        let linux = read(&out, "guide/install.linux.html");
        assert!(linux.contains("Used as knowl in"));
        assert!(linux.contains("Installation"));
    }

    #[test]
    fn test_module_index_and_front_page() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());
        let out = tmp.path().join("out");
        render_site(&site, &out).unwrap();

        let front = read(&out, "index.html");
        assert!(front.contains(r#"href="guide/index.html""#));

        let index = read(&out, "guide/index.html");
        assert!(index.contains(r#"class="entry dir level-0""#));
        assert!(index.contains(r#"<a href="install.linux.html">Linux</a>"#));
        assert!(index.contains(r#"<p class="landing"><a href="intro.html">Intro</a></p>"#));
    }

    #[test]
    fn test_graph_json() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());
        let out = tmp.path().join("out");
        render_site(&site, &out).unwrap();

        let graph: serde_json::Value = serde_json::from_str(&read(&out, "graph.json")).unwrap();
        assert_eq!(graph["fingerprint"], site.fingerprint());
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
        assert!(graph["links"]
            .as_array()
            .unwrap()
            .contains(&json!({"source": "guide/intro", "target": "guide/overview"})));
        assert_eq!(graph["knowls"].as_array().unwrap().len(), 1);
        assert_eq!(graph["hashtags"]["rust"], json!(["guide/intro"]));
    }

    #[test]
    fn test_path_like_tag_is_rejected_before_rendering() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "src/guide/config.yaml",
            "name: Guide\ndescription: The guide\n",
        );
        write(
            tmp.path(),
            "src/guide/intro.md",
            "---\ntitle: Intro\ntags: [\"../../escaped\"]\n---\nBody.\n",
        );
        let config = Config::from_yaml_str("title: T\nmodules: [guide]\n")
            .unwrap()
            .with_source_dir(tmp.path().join("src"));

        let err = SiteBuilder::new(config).build().unwrap_err();
        assert!(err.to_string().contains("../../escaped"), "{err}");
        assert!(!tmp.path().join("escaped.html").exists());
    }

    #[test]
    fn test_output_is_wiped() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());
        let out = tmp.path().join("out");
        write(&out, "stale.html", "old");

        render_site(&site, &out).unwrap();
        assert!(!out.join("stale.html").exists());
    }

    #[test]
    fn test_refuses_to_wipe_source() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());

        let err = render_site(&site, tmp.path()).unwrap_err();
        assert!(matches!(err, RenderError::UnsafeOutput { .. }));
        assert!(tmp.path().join("src/guide/intro.md").exists());
    }

    #[test]
    fn test_fixed_creation_date() {
        let tmp = TempDir::new().unwrap();
        let site = build_site(tmp.path());
        let out = tmp.path().join("out");
        let created = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        SiteRenderer::new(&site)
            .with_created(created)
            .render(&out)
            .unwrap();
        assert!(read(&out, "index.html").contains("2024-03-01 12:30 UTC"));
    }
}
