//! Module indexes and sibling navigation.
//!
//! Built after the consistency check. Siblings under one tree node are
//! ordered by `(sort, segment)`; a document uses its own `sort` metadata and a
//! directory uses the `sort` of its `config.yaml`. A node that is both a
//! document and a directory yields one entry of each kind.

use crate::models::{title_case, Document};
use crate::store::{DocumentStore, DocumentationModule};
use crate::tree::TreeNode;
use scientia_types::{DocId, Namespace};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One line of a module index page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub kind: EntryKind,
    /// Nesting level, 0 for top-level entries
    pub depth: usize,
    /// Dot-path of the node
    pub path: String,
    pub title: String,
    /// Page of a file entry, relative to the module directory
    pub href: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    pub sort: f64,
}

/// Index entries of every module, computed once per build
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    indexes: BTreeMap<Namespace, Vec<IndexEntry>>,
}

impl Navigation {
    /// Build all module indexes and assign `prev`/`next` on every document
    pub fn build(store: &mut DocumentStore) -> Self {
        let mut indexes = BTreeMap::new();
        for module in store.modules_mut() {
            assign_siblings(module);
            indexes.insert(module.namespace().clone(), module_index(module));
        }
        Navigation { indexes }
    }

    /// Depth-first index of one module
    pub fn index(&self, namespace: &Namespace) -> &[IndexEntry] {
        self.indexes
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

struct Slot<'m> {
    kind: EntryKind,
    segment: &'m str,
    sort: f64,
    node: &'m TreeNode,
}

fn compare(a: &Slot<'_>, b: &Slot<'_>) -> Ordering {
    a.sort
        .total_cmp(&b.sort)
        .then_with(|| a.segment.cmp(b.segment))
        .then_with(|| a.kind.cmp(&b.kind))
}

/// Entries directly below `node`, ordered
fn slots<'m>(module: &'m DocumentationModule, node: &'m TreeNode) -> Vec<Slot<'m>> {
    let mut slots = Vec::new();
    for (segment, child) in node.children() {
        if let Some(docid) = child.document() {
            slots.push(Slot {
                kind: EntryKind::File,
                segment,
                sort: module.get(docid).map(Document::sort).unwrap_or(0.0),
                node: child,
            });
        }
        if child.is_directory() {
            slots.push(Slot {
                kind: EntryKind::Dir,
                segment,
                sort: child.directory().sort.unwrap_or(0.0),
                node: child,
            });
        }
    }
    slots.sort_by(compare);
    slots
}

/// Depth-first index of a module's tree
pub fn module_index(module: &DocumentationModule) -> Vec<IndexEntry> {
    let mut entries = Vec::new();
    collect_entries(module, module.tree(), 0, "", &mut entries);
    entries
}

fn collect_entries(
    module: &DocumentationModule,
    node: &TreeNode,
    depth: usize,
    prefix: &str,
    out: &mut Vec<IndexEntry>,
) {
    for slot in slots(module, node) {
        let path = if prefix.is_empty() {
            slot.segment.to_string()
        } else {
            format!("{prefix}.{}", slot.segment)
        };

        match slot.kind {
            EntryKind::File => {
                let document = slot.node.document().and_then(|docid| module.get(docid));
                let meta = document.and_then(Document::meta);
                out.push(IndexEntry {
                    kind: EntryKind::File,
                    depth,
                    title: document
                        .map(Document::title)
                        .unwrap_or_else(|| title_case(slot.segment)),
                    href: Some(format!("{path}.html")),
                    description: meta.and_then(|m| m.subtitle.clone()),
                    group: meta.and_then(|m| m.group.clone()),
                    sort: slot.sort,
                    path,
                });
            }
            EntryKind::Dir => {
                out.push(IndexEntry {
                    kind: EntryKind::Dir,
                    depth,
                    title: slot
                        .node
                        .directory()
                        .title
                        .clone()
                        .unwrap_or_else(|| title_case(slot.segment)),
                    href: None,
                    description: None,
                    group: None,
                    sort: slot.sort,
                    path: path.clone(),
                });
                collect_entries(module, slot.node, depth + 1, &path, out);
            }
        }
    }
}

/// Link every document to its previous and next sibling document
pub(crate) fn assign_siblings(module: &mut DocumentationModule) {
    let mut groups: Vec<Vec<DocId>> = Vec::new();
    collect_siblings(module, module.tree(), &mut groups);

    for siblings in groups {
        for (i, docid) in siblings.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| siblings[p].clone());
            let next = siblings.get(i + 1).cloned();
            if let Some(document) = module.document_mut(docid) {
                document.set_siblings(prev, next);
            }
        }
    }
}

fn collect_siblings(module: &DocumentationModule, node: &TreeNode, groups: &mut Vec<Vec<DocId>>) {
    let slots = slots(module, node);
    let siblings: Vec<DocId> = slots
        .iter()
        .filter(|slot| slot.kind == EntryKind::File)
        .filter_map(|slot| slot.node.document().cloned())
        .collect();
    if !siblings.is_empty() {
        groups.push(siblings);
    }
    for slot in slots.iter().filter(|slot| slot.kind == EntryKind::Dir) {
        collect_siblings(module, slot.node, groups);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DirectoryConfig, ModuleConfig};
    use crate::models::DocumentMeta;

    fn id(s: &str) -> DocId {
        DocId::new(s).unwrap()
    }

    fn module_with(docs: &[(&str, &str, f64)]) -> DocumentationModule {
        let config = ModuleConfig {
            name: "Guide".to_string(),
            description: "The guide".to_string(),
            landing_page: None,
            extra: BTreeMap::new(),
        };
        let ns = Namespace::new("guide").unwrap();
        let mut module = DocumentationModule::new(ns.clone(), config, "guide");
        for (docid, title, sort) in docs {
            let mut document = Document::new(ns.clone(), id(docid), "", format!("{docid}.md"));
            let mut meta = DocumentMeta::new(*title);
            meta.sort = *sort;
            document.attach(String::new(), meta);
            module.add_document(document).unwrap();
        }
        module
    }

    fn paths(entries: &[IndexEntry]) -> Vec<(EntryKind, &str, usize)> {
        entries
            .iter()
            .map(|e| (e.kind, e.path.as_str(), e.depth))
            .collect()
    }

    #[test]
    fn test_entries_sorted_by_sort_then_segment() {
        let module = module_with(&[
            ("zeta", "Zeta", -1.0),
            ("alpha", "Alpha", 0.0),
            ("beta", "Beta", 0.0),
        ]);
        let entries = module_index(&module);
        assert_eq!(
            paths(&entries),
            [
                (EntryKind::File, "zeta", 0),
                (EntryKind::File, "alpha", 0),
                (EntryKind::File, "beta", 0),
            ]
        );
        assert_eq!(entries[1].href.as_deref(), Some("alpha.html"));
        assert_eq!(entries[1].title, "Alpha");
    }

    #[test]
    fn test_document_and_directory_on_one_node() {
        let mut module = module_with(&[
            ("install", "Installing", 0.0),
            ("install.linux", "Linux", 0.0),
            ("install.mac", "Mac", 0.0),
            ("about", "About", 5.0),
        ]);
        module.set_directory(
            ["install"],
            DirectoryConfig {
                title: Some("Installation".to_string()),
                sort: Some(10.0),
            },
        );

        let entries = module_index(&module);
        assert_eq!(
            paths(&entries),
            [
                (EntryKind::File, "install", 0),
                (EntryKind::File, "about", 0),
                (EntryKind::Dir, "install", 0),
                (EntryKind::File, "install.linux", 1),
                (EntryKind::File, "install.mac", 1),
            ]
        );
        assert_eq!(entries[2].title, "Installation");
        assert_eq!(entries[2].href, None);
    }

    #[test]
    fn test_untitled_directory_is_title_cased() {
        let module = module_with(&[("setup.index", "Setup", 0.0), ("setup.index.more", "More", 0.0)]);
        let entries = module_index(&module);
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[0].title, "Setup");
    }

    #[test]
    fn test_siblings_linked_within_parent() {
        let mut module = module_with(&[
            ("a", "A", 0.0),
            ("b", "B", 0.0),
            ("c", "C", -1.0),
            ("b.x", "X", 0.0),
        ]);
        assign_siblings(&mut module);

        let c = module.get(&id("c")).unwrap();
        assert_eq!(c.prev(), None);
        assert_eq!(c.next(), Some(&id("a")));

        let a = module.get(&id("a")).unwrap();
        assert_eq!(a.prev(), Some(&id("c")));
        assert_eq!(a.next(), Some(&id("b")));

        let b = module.get(&id("b")).unwrap();
        assert_eq!(b.next(), None);

        let x = module.get(&id("b.x")).unwrap();
        assert_eq!(x.prev(), None);
        assert_eq!(x.next(), None);
    }

    #[test]
    fn test_navigation_build_covers_all_modules() {
        let mut store = DocumentStore::new();
        store
            .register_module(module_with(&[("one", "One", 0.0), ("two", "Two", 0.0)]))
            .unwrap();

        let navigation = Navigation::build(&mut store);
        let ns = Namespace::new("guide").unwrap();
        assert_eq!(navigation.index(&ns).len(), 2);
        assert!(navigation.index(&Namespace::new("other").unwrap()).is_empty());
        assert_eq!(
            store.get(&scientia_types::QualifiedId::new(ns, id("one"))).unwrap().next(),
            Some(&id("two"))
        );
    }
}
