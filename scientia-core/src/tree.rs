//! Hierarchical document tree of a module.
//!
//! Docids are dot-separated paths. Each segment is a [`TreeNode`] that may
//! hold a document, child nodes, or both: `guide` can be a page of its own
//! while `guide.install` lives underneath it.

use crate::config::DirectoryConfig;
use scientia_types::DocId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    document: Option<DocId>,
    directory: DirectoryConfig,
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document stored exactly at this path
    pub fn document(&self) -> Option<&DocId> {
        self.document.as_ref()
    }

    pub fn is_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn is_directory(&self) -> bool {
        !self.children.is_empty()
    }

    /// Directory overrides from a per-directory `config.yaml`
    pub fn directory(&self) -> &DirectoryConfig {
        &self.directory
    }

    /// Children keyed by segment, in lexical segment order
    pub fn children(&self) -> &BTreeMap<String, TreeNode> {
        &self.children
    }

    pub fn child(&self, segment: &str) -> Option<&TreeNode> {
        self.children.get(segment)
    }

    /// Walk down a sequence of segments
    pub fn get<'a, I>(&self, segments: I) -> Option<&TreeNode>
    where
        I: IntoIterator<Item = &'a str>,
    {
        segments
            .into_iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Node of a document id, if that path exists
    pub fn node_of(&self, docid: &DocId) -> Option<&TreeNode> {
        self.get(docid.segments())
    }

    /// Record `docid` at its path, creating intermediate nodes
    pub(crate) fn insert(&mut self, docid: &DocId) {
        let node = self.entry(docid.segments());
        node.document = Some(docid.clone());
    }

    /// Attach directory overrides at a path, creating nodes as needed
    pub(crate) fn set_directory<'a, I>(&mut self, segments: I, config: DirectoryConfig)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.entry(segments).directory = config;
    }

    fn entry<'a, I>(&mut self, segments: I) -> &mut TreeNode
    where
        I: IntoIterator<Item = &'a str>,
    {
        segments.into_iter().fold(self, |node, segment| {
            node.children.entry(segment.to_string()).or_default()
        })
    }

    /// Every document below this node in depth-first segment order
    pub fn documents(&self) -> Vec<&DocId> {
        let mut out = Vec::new();
        self.collect_documents(&mut out);
        out
    }

    fn collect_documents<'a>(&'a self, out: &mut Vec<&'a DocId>) {
        if let Some(doc) = &self.document {
            out.push(doc);
        }
        for child in self.children.values() {
            child.collect_documents(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DocId {
        DocId::new(s).unwrap()
    }

    #[test]
    fn test_insert_creates_intermediate_nodes() {
        let mut root = TreeNode::new();
        root.insert(&id("guide.install.linux"));

        let guide = root.child("guide").unwrap();
        assert!(!guide.is_document());
        assert!(guide.is_directory());

        let linux = root.get(["guide", "install", "linux"]).unwrap();
        assert_eq!(linux.document(), Some(&id("guide.install.linux")));
        assert!(!linux.is_directory());
    }

    #[test]
    fn test_node_can_be_document_and_directory() {
        let mut root = TreeNode::new();
        root.insert(&id("guide.install"));
        root.insert(&id("guide"));

        let guide = root.node_of(&id("guide")).unwrap();
        assert!(guide.is_document());
        assert!(guide.is_directory());
    }

    #[test]
    fn test_documents_depth_first() {
        let mut root = TreeNode::new();
        root.insert(&id("zeta"));
        root.insert(&id("alpha.two"));
        root.insert(&id("alpha"));
        root.insert(&id("alpha.one"));

        let docs: Vec<&str> = root.documents().into_iter().map(|d| d.as_str()).collect();
        assert_eq!(docs, ["alpha", "alpha.one", "alpha.two", "zeta"]);
    }

    #[test]
    fn test_directory_config_attached() {
        let mut root = TreeNode::new();
        root.set_directory(
            ["guide"],
            DirectoryConfig {
                title: Some("User Guide".into()),
                sort: Some(2.0),
            },
        );
        root.insert(&id("guide.intro"));

        let guide = root.child("guide").unwrap();
        assert_eq!(guide.directory().title.as_deref(), Some("User Guide"));
        assert!(root.get(["missing"]).is_none());
    }
}
