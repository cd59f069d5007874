//! Cross-reference registry: hashtags, links, knowls.
//!
//! References are recorded while documents are converted, before every
//! target necessarily exists. Nothing here checks that targets resolve; that
//! happens once, after conversion, in [`crate::check`].

use scientia_types::{DocId, Namespace, QualifiedId};
use std::collections::{BTreeMap, BTreeSet};

/// Sets of referencing documents keyed by what they reference
pub type ReferenceIndex = BTreeMap<QualifiedId, BTreeSet<QualifiedId>>;

#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
    hashtags: BTreeMap<String, BTreeSet<QualifiedId>>,
    backlinks: ReferenceIndex,
    knowls: ReferenceIndex,
    forward_links: ReferenceIndex,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_hashtag(&mut self, tag: &str, document: &QualifiedId) {
        self.hashtags
            .entry(tag.to_lowercase())
            .or_default()
            .insert(document.clone());
    }

    /// Record that `source` links to `target`; self-links are ignored
    pub fn register_link(&mut self, target: &QualifiedId, source: &QualifiedId) {
        if target == source {
            return;
        }
        self.backlinks
            .entry(target.clone())
            .or_default()
            .insert(source.clone());
        self.forward_links
            .entry(source.clone())
            .or_default()
            .insert(target.clone());
    }

    /// Record a knowl transclusion; it also counts as a link, except that a
    /// self-knowl adds no backlink
    pub fn register_knowl(&mut self, target: &QualifiedId, source: &QualifiedId) {
        self.knowls
            .entry(target.clone())
            .or_default()
            .insert(source.clone());
        self.register_link(target, source);
    }

    pub fn hashtags(&self) -> &BTreeMap<String, BTreeSet<QualifiedId>> {
        &self.hashtags
    }

    pub fn backlinks(&self) -> &ReferenceIndex {
        &self.backlinks
    }

    pub fn knowls(&self) -> &ReferenceIndex {
        &self.knowls
    }

    pub fn forward_links(&self) -> &ReferenceIndex {
        &self.forward_links
    }

    /// Documents tagged with `tag` (case-insensitive)
    pub fn tagged(&self, tag: &str) -> impl Iterator<Item = &QualifiedId> {
        self.hashtags.get(&tag.to_lowercase()).into_iter().flatten()
    }

    /// Documents linking to `target`
    pub fn backlinks_of(&self, target: &QualifiedId) -> impl Iterator<Item = &QualifiedId> {
        self.backlinks.get(target).into_iter().flatten()
    }

    /// Documents embedding `target` as a knowl
    pub fn knowls_of(&self, target: &QualifiedId) -> impl Iterator<Item = &QualifiedId> {
        self.knowls.get(target).into_iter().flatten()
    }

    /// Targets referenced by `source`
    pub fn links_from(&self, source: &QualifiedId) -> impl Iterator<Item = &QualifiedId> {
        self.forward_links.get(source).into_iter().flatten()
    }

    /// Convenience lookup by parts
    pub fn has_backlink(&self, namespace: &Namespace, docid: &DocId, source: &QualifiedId) -> bool {
        self.backlinks
            .get(&QualifiedId::new(namespace.clone(), docid.clone()))
            .is_some_and(|set| set.contains(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> QualifiedId {
        QualifiedId::parse(s).unwrap()
    }

    #[test]
    fn test_link_registers_both_directions() {
        let mut registry = ReferenceRegistry::new();
        registry.register_link(&q("guide/overview"), &q("guide/intro"));

        let back: Vec<_> = registry.backlinks_of(&q("guide/overview")).collect();
        assert_eq!(back, [&q("guide/intro")]);
        let fwd: Vec<_> = registry.links_from(&q("guide/intro")).collect();
        assert_eq!(fwd, [&q("guide/overview")]);
    }

    #[test]
    fn test_self_link_is_ignored() {
        let mut registry = ReferenceRegistry::new();
        registry.register_link(&q("guide/intro"), &q("guide/intro"));

        assert!(registry.backlinks().is_empty());
        assert!(registry.forward_links().is_empty());
    }

    #[test]
    fn test_self_knowl_kept_without_backlink() {
        let mut registry = ReferenceRegistry::new();
        registry.register_knowl(&q("guide/pp"), &q("guide/pp"));

        assert_eq!(
            registry.knowls_of(&q("guide/pp")).collect::<Vec<_>>(),
            [&q("guide/pp")]
        );
        assert!(registry.backlinks().is_empty());
        assert!(registry.forward_links().is_empty());
    }

    #[test]
    fn test_same_docid_other_namespace_is_not_self() {
        let mut registry = ReferenceRegistry::new();
        registry.register_link(&q("api/intro"), &q("guide/intro"));
        assert_eq!(registry.backlinks().len(), 1);
    }

    #[test]
    fn test_knowl_implies_backlink() {
        let mut registry = ReferenceRegistry::new();
        registry.register_knowl(&q("guide/term"), &q("guide/intro"));

        assert_eq!(registry.knowls_of(&q("guide/term")).count(), 1);
        assert!(registry.has_backlink(
            &Namespace::new("guide").unwrap(),
            &DocId::new("term").unwrap(),
            &q("guide/intro"),
        ));
    }

    #[test]
    fn test_hashtags_lowercased_and_deduplicated() {
        let mut registry = ReferenceRegistry::new();
        registry.register_hashtag("Rust", &q("guide/intro"));
        registry.register_hashtag("rust", &q("guide/intro"));
        registry.register_hashtag("RUST", &q("guide/other"));

        assert_eq!(registry.hashtags().len(), 1);
        assert_eq!(registry.tagged("rust").count(), 2);
        assert_eq!(registry.tagged("Rust").count(), 2);
    }

    #[test]
    fn test_repeated_links_accumulate_once() {
        let mut registry = ReferenceRegistry::new();
        registry.register_link(&q("guide/b"), &q("guide/a"));
        registry.register_link(&q("guide/b"), &q("guide/a"));
        registry.register_link(&q("guide/b"), &q("guide/c"));

        assert_eq!(registry.backlinks_of(&q("guide/b")).count(), 2);
    }
}
