//! Document store: modules, their documents and document trees.

use crate::config::{DirectoryConfig, ModuleConfig};
use crate::models::{title_case, Breadcrumb, Document};
use crate::tree::TreeNode;
use scientia_types::{DocId, Namespace, QualifiedId};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("module '{0}' is already registered")]
    DuplicateModule(Namespace),

    #[error("document '{id}' belongs to unregistered module '{}'", .id.namespace)]
    UnknownModule { id: QualifiedId },

    #[error(transparent)]
    DuplicateDocument(#[from] Box<DuplicateDocument>),

    #[error("document '{0}' not found")]
    NotFound(QualifiedId),

    #[error("module '{0}' not found")]
    ModuleNotFound(String),
}

/// A second document claimed an id that is already taken.
///
/// Calling layers add the source path and processing index as they learn
/// about them, so the final message points at the offending file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "duplicate document '{id}'{}{}, already defined in {existing}",
    path_note(.path),
    index_note(.index)
)]
pub struct DuplicateDocument {
    pub id: QualifiedId,
    /// Source of the document registered first
    pub existing: PathBuf,
    /// Source of the rejected document
    pub path: Option<PathBuf>,
    /// Position of the rejected document in processing order
    pub index: Option<usize>,
}

impl DuplicateDocument {
    pub fn with_path(mut self: Box<Self>, path: impl Into<PathBuf>) -> Box<Self> {
        self.path = Some(path.into());
        self
    }

    pub fn with_index(mut self: Box<Self>, index: usize) -> Box<Self> {
        self.index = Some(index);
        self
    }
}

fn path_note(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

fn index_note(index: &Option<usize>) -> String {
    index
        .map(|index| format!(" (document #{index})"))
        .unwrap_or_default()
}

/// One documentation module: a namespace with its documents and tree
#[derive(Debug, Clone)]
pub struct DocumentationModule {
    namespace: Namespace,
    config: ModuleConfig,
    path: PathBuf,
    documents: BTreeMap<DocId, Document>,
    tree: TreeNode,
}

impl DocumentationModule {
    pub fn new(namespace: Namespace, config: ModuleConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            namespace,
            config,
            path: path.into(),
            documents: BTreeMap::new(),
            tree: TreeNode::new(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn landing_page(&self) -> Option<&str> {
        self.config.landing_page.as_deref()
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Module root directory
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn get(&self, docid: &DocId) -> Option<&Document> {
        self.documents.get(docid)
    }

    pub fn contains(&self, docid: &DocId) -> bool {
        self.documents.contains_key(docid)
    }

    pub fn contains_str(&self, docid: &str) -> bool {
        DocId::new(docid)
            .map(|id| self.contains(&id))
            .unwrap_or(false)
    }

    /// Documents ordered by docid
    pub fn documents(&self) -> impl Iterator<Item = (&DocId, &Document)> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn add_document(&mut self, document: Document) -> Result<(), Box<DuplicateDocument>> {
        let docid = document.docid().clone();
        if let Some(existing) = self.documents.get(&docid) {
            return Err(Box::new(DuplicateDocument {
                id: document.id().clone(),
                existing: existing.source_path().to_path_buf(),
                path: Some(document.source_path().to_path_buf()),
                index: None,
            }));
        }
        self.tree.insert(&docid);
        self.documents.insert(docid, document);
        Ok(())
    }

    /// Attach per-directory title and sort overrides
    pub fn set_directory<'a, I>(&mut self, segments: I, config: DirectoryConfig)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.tree.set_directory(segments, config);
    }

    /// Trail from the module root down to `docid`
    pub fn breadcrumbs(&self, docid: &DocId) -> Vec<Breadcrumb> {
        let segments: Vec<&str> = docid.segments().collect();
        let mut node = Some(&self.tree);
        let mut crumbs = Vec::with_capacity(segments.len());

        for (level, segment) in segments.iter().enumerate() {
            node = node.and_then(|n| n.child(segment));
            let path = segments[..=level].join(".");
            let label = if level + 1 == segments.len() {
                self.get(docid)
                    .map(Document::title)
                    .unwrap_or_else(|| title_case(segment))
            } else {
                node.and_then(|n| n.directory().title.clone())
                    .unwrap_or_else(|| title_case(segment))
            };
            crumbs.push(Breadcrumb { label, path });
        }
        crumbs
    }

    pub(crate) fn document_mut(&mut self, docid: &DocId) -> Option<&mut Document> {
        self.documents.get_mut(docid)
    }
}

impl fmt::Display for DocumentationModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module {}", self.config.name)
    }
}

/// All modules of one build, in registration order
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    modules: Vec<DocumentationModule>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module(&mut self, module: DocumentationModule) -> Result<(), StoreError> {
        if self.module(module.namespace()).is_some() {
            return Err(StoreError::DuplicateModule(module.namespace().clone()));
        }
        tracing::debug!("registered module {}", module.namespace());
        self.modules.push(module);
        Ok(())
    }

    /// Add a document to the module named by its namespace
    pub fn register(&mut self, document: Document) -> Result<(), StoreError> {
        let Some(module) = self.module_mut(document.namespace()) else {
            return Err(StoreError::UnknownModule {
                id: document.id().clone(),
            });
        };
        module.add_document(document)?;
        Ok(())
    }

    pub fn lookup(&self, namespace: &Namespace, docid: &DocId) -> Result<&Document, StoreError> {
        self.module(namespace)
            .and_then(|m| m.get(docid))
            .ok_or_else(|| StoreError::NotFound(QualifiedId::new(namespace.clone(), docid.clone())))
    }

    pub fn get(&self, id: &QualifiedId) -> Option<&Document> {
        self.module(&id.namespace).and_then(|m| m.get(&id.docid))
    }

    pub fn contains(&self, id: &QualifiedId) -> bool {
        self.get(id).is_some()
    }

    pub fn module(&self, namespace: &Namespace) -> Option<&DocumentationModule> {
        self.modules.iter().find(|m| m.namespace() == namespace)
    }

    pub fn module_by_name(&self, namespace: &str) -> Result<&DocumentationModule, StoreError> {
        self.modules
            .iter()
            .find(|m| m.namespace().as_str() == namespace)
            .ok_or_else(|| StoreError::ModuleNotFound(namespace.to_string()))
    }

    pub(crate) fn module_mut(&mut self, namespace: &Namespace) -> Option<&mut DocumentationModule> {
        self.modules.iter_mut().find(|m| m.namespace() == namespace)
    }

    /// Modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &DocumentationModule> {
        self.modules.iter()
    }

    pub(crate) fn modules_mut(&mut self) -> impl Iterator<Item = &mut DocumentationModule> {
        self.modules.iter_mut()
    }

    /// Total number of documents across modules
    pub fn document_count(&self) -> usize {
        self.modules.iter().map(DocumentationModule::len).sum()
    }
}
