//! Depth-first traversal with declared-path caching
//!
//! A node's declared path is `path_from + name`, where `path_from` is derived
//! from the parent's path by the child collection the node sits in (see
//! [`crate::node::ChildPrefix`]). Paths are computed on first visit and
//! cached on the node; later visits reuse the cache.

use crate::node::{Node, NodeKind};
use crate::options::VisitOptions;
use crate::reference::RefTarget;
use crate::error::Result;
use crate::{Corpus, NodeId};
use ahash::AHashSet;

/// Name used for nodes without one.
pub const UNNAMED: &str = "UNNAMED";

/// Name used for explicit references whose definition is inlined.
pub const INLINE_REF: &str = "(ref)";

impl Corpus {
    /// The last component of a node's declared path.
    pub(crate) fn path_segment(&self, id: NodeId) -> String {
        let node = self.node_unchecked(id);
        match node.kind() {
            NodeKind::Reference(r) => match &r.target {
                RefTarget::Named(name) if !name.is_empty() => name.clone(),
                _ => INLINE_REF.to_string(),
            },
            kind => match kind.name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => UNNAMED.to_string(),
            },
        }
    }

    fn path_for_visit(&mut self, id: NodeId, path_from: &str, options: VisitOptions) -> String {
        if options.cache_declared_paths {
            if let Some(path) = self.node_unchecked(id).declared_path() {
                return path.to_string();
            }
        }

        let path = format!("{path_from}{}", self.path_segment(id));
        self.paths_computed += 1;
        if options.cache_declared_paths {
            if let Ok(node) = self.node_mut(id) {
                node.declared_path = Some(path.clone());
            }
        }
        path
    }

    /// Walk the subtree under `id` depth first.
    ///
    /// `pre` runs before a node's children and `post` after them; either may
    /// return `true` to stop the walk, in which case nothing else is called
    /// and `Ok(true)` is returned. Siblings are visited in declared order.
    /// Child ids that name no node, or that lead back to an ancestor, are
    /// logged and skipped.
    pub fn visit<Pre, Post>(
        &mut self,
        id: NodeId,
        path_from: &str,
        mut pre: Pre,
        mut post: Post,
        options: VisitOptions,
    ) -> Result<bool>
    where
        Pre: FnMut(NodeId, &Node, &str) -> bool,
        Post: FnMut(NodeId, &Node, &str) -> bool,
    {
        self.node(id)?;
        let mut ancestors = AHashSet::new();
        Ok(self.walk(id, path_from, &mut pre, &mut post, options, &mut ancestors))
    }

    /// [`Corpus::visit`] with the corpus-wide caching default.
    pub fn visit_all<Pre, Post>(&mut self, id: NodeId, pre: Pre, post: Post) -> Result<bool>
    where
        Pre: FnMut(NodeId, &Node, &str) -> bool,
        Post: FnMut(NodeId, &Node, &str) -> bool,
    {
        let options = VisitOptions {
            cache_declared_paths: self.context().options.cache_declared_paths,
        };
        self.visit(id, "", pre, post, options)
    }

    fn walk<Pre, Post>(
        &mut self,
        id: NodeId,
        path_from: &str,
        pre: &mut Pre,
        post: &mut Post,
        options: VisitOptions,
        ancestors: &mut AHashSet<NodeId>,
    ) -> bool
    where
        Pre: FnMut(NodeId, &Node, &str) -> bool,
        Post: FnMut(NodeId, &Node, &str) -> bool,
    {
        let path = self.path_for_visit(id, path_from, options);

        let node = self.node_unchecked(id);
        if pre(id, node, &path) {
            return true;
        }

        ancestors.insert(id);
        for group in node.kind().child_groups() {
            let child_from = group.prefix.apply(&path);
            for child in group.ids {
                if self.get(child).is_none() {
                    tracing::warn!(parent = %id, child = %child, "skipping child that is not in the corpus");
                    continue;
                }
                if ancestors.contains(&child) {
                    tracing::warn!(parent = %id, child = %child, "skipping child that is also an ancestor");
                    continue;
                }
                if self.walk(child, &child_from, pre, post, options, ancestors) {
                    return true;
                }
            }
        }
        ancestors.remove(&id);

        post(id, self.node_unchecked(id), &path)
    }

    /// Forget the cached declared path of `id`, and of its subtree when
    /// `recursive` is set.
    pub fn invalidate_declared_path(&mut self, id: NodeId, recursive: bool) -> Result<()> {
        let targets = if recursive { self.subtree(id)? } else { vec![id] };
        for target in targets {
            self.node_mut(target)?.declared_path = None;
        }
        Ok(())
    }

    /// Number of declared paths built so far.
    pub fn declared_paths_computed(&self) -> usize {
        self.paths_computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EntityDef, TypeAttributeDef};
    use crate::document::DocumentDef;
    use crate::ObjectType;
    use schemagraph_storage::StorageManager;

    fn no_stop(_: NodeId, _: &Node, _: &str) -> bool {
        false
    }

    /// Document with entity `Customer { id: string, name }` exhibiting a trait.
    fn customer() -> (Corpus, NodeId, NodeId) {
        let mut corpus = Corpus::with_storage(StorageManager::new());
        let doc = corpus.make_object(NodeKind::Document(DocumentDef::new("Customer.cdm.json", "local:/")));
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Customer")));
        let data_type = corpus.make_ref(ObjectType::DataTypeRef, "string", true);
        let mut id_attr = TypeAttributeDef::new("id");
        id_attr.data_type = Some(data_type);
        let id_attr = corpus.make_object(NodeKind::TypeAttribute(id_attr));
        let name_attr = corpus.make_object(NodeKind::TypeAttribute(TypeAttributeDef::new("name")));
        let trait_ref = corpus.make_ref(ObjectType::TraitRef, "is.CDM.entityVersion", true);

        corpus.add_attribute(entity, id_attr).unwrap();
        corpus.add_attribute(entity, name_attr).unwrap();
        corpus.add_trait(entity, trait_ref).unwrap();
        corpus.add_definition(doc, entity).unwrap();
        (corpus, doc, entity)
    }

    fn collect_paths(corpus: &mut Corpus, root: NodeId, options: VisitOptions) -> Vec<String> {
        let mut paths = Vec::new();
        corpus
            .visit(
                root,
                "",
                |_, _, path| {
                    paths.push(path.to_string());
                    false
                },
                no_stop,
                options,
            )
            .unwrap();
        paths
    }

    #[test]
    fn paths_follow_child_collections() {
        let (mut corpus, doc, _) = customer();
        let paths = collect_paths(&mut corpus, doc, VisitOptions::default());
        assert_eq!(
            paths,
            vec![
                "Customer.cdm.json",
                "Customer",
                "Customer/exhibitsTraits/is.CDM.entityVersion",
                "Customer/hasAttributes/id",
                "Customer/hasAttributes/id/dataType/string",
                "Customer/hasAttributes/name",
            ]
        );
    }

    #[test]
    fn second_visit_reuses_cached_paths() {
        let (mut corpus, _, entity) = customer();
        let first = collect_paths(&mut corpus, entity, VisitOptions::default());
        let computed = corpus.declared_paths_computed();
        assert_eq!(computed, first.len());

        let second = collect_paths(&mut corpus, entity, VisitOptions::default());
        assert_eq!(first, second);
        assert_eq!(corpus.declared_paths_computed(), computed);
        assert_eq!(corpus.node(entity).unwrap().declared_path(), Some("Customer"));
    }

    #[test]
    fn disabled_cache_computes_fresh_and_leaves_nodes_untouched() {
        let (mut corpus, _, entity) = customer();
        let options = VisitOptions {
            cache_declared_paths: false,
        };
        let first = collect_paths(&mut corpus, entity, options);
        let second = collect_paths(&mut corpus, entity, options);
        assert_eq!(first, second);
        assert_eq!(corpus.declared_paths_computed(), first.len() * 2);
        assert_eq!(corpus.node(entity).unwrap().declared_path(), None);
    }

    #[test]
    fn pre_stop_short_circuits_the_walk() {
        let (mut corpus, doc, _) = customer();
        let mut seen = Vec::new();
        let mut post_calls = 0;
        let stopped = corpus
            .visit(
                doc,
                "",
                |_, node, path| {
                    seen.push(path.to_string());
                    node.name() == Some("id")
                },
                |_, _, _| {
                    post_calls += 1;
                    false
                },
                VisitOptions::default(),
            )
            .unwrap();

        assert!(stopped);
        assert_eq!(seen.last().map(String::as_str), Some("Customer/hasAttributes/id"));
        assert!(!seen.iter().any(|p| p.ends_with("/name")));
        // only the trait reference finished before the stop
        assert_eq!(post_calls, 1);
    }

    #[test]
    fn post_stop_is_reported() {
        let (mut corpus, doc, _) = customer();
        let stopped = corpus
            .visit(doc, "", no_stop, |_, node, _| node.name() == Some("string"), VisitOptions::default())
            .unwrap();
        assert!(stopped);
    }

    #[test]
    fn pre_runs_before_children_and_post_after() {
        let (mut corpus, _, entity) = customer();
        let mut events = Vec::new();
        let mut post_events = Vec::new();
        corpus
            .visit(
                entity,
                "",
                |_, _, path| {
                    events.push(format!("pre {path}"));
                    false
                },
                |_, _, path| {
                    post_events.push(format!("post {path}"));
                    false
                },
                VisitOptions::default(),
            )
            .unwrap();

        assert_eq!(events.first().map(String::as_str), Some("pre Customer"));
        assert_eq!(post_events.last().map(String::as_str), Some("post Customer"));
        assert_eq!(post_events[0], "post Customer/exhibitsTraits/is.CDM.entityVersion");
    }

    #[test]
    fn unnamed_nodes_get_placeholder() {
        let mut corpus = Corpus::with_storage(StorageManager::new());
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("")));
        let paths = collect_paths(&mut corpus, entity, VisitOptions::default());
        assert_eq!(paths, vec![UNNAMED]);
    }

    #[test]
    fn explicit_reference_descends_into_inline_definition() {
        let mut corpus = Corpus::with_storage(StorageManager::new());
        let inline = corpus.make_object(NodeKind::Entity(EntityDef::new("Address")));
        let reference = corpus.make_explicit_ref(ObjectType::EntityRef, inline);
        let paths = collect_paths(&mut corpus, reference, VisitOptions::default());
        assert_eq!(paths, vec![INLINE_REF.to_string(), format!("{INLINE_REF}/Address")]);
        assert_eq!(corpus.name_of(reference), Some("Address"));
    }

    #[test]
    fn invalidation_forces_recomputation() {
        let (mut corpus, _, entity) = customer();
        collect_paths(&mut corpus, entity, VisitOptions::default());
        let computed = corpus.declared_paths_computed();

        corpus.invalidate_declared_path(entity, true).unwrap();
        collect_paths(&mut corpus, entity, VisitOptions::default());
        assert_eq!(corpus.declared_paths_computed(), computed * 2);
    }

    #[test]
    fn unknown_root_is_an_error() {
        let mut corpus = Corpus::with_storage(StorageManager::new());
        assert!(corpus
            .visit(NodeId(3), "", no_stop, no_stop, VisitOptions::default())
            .is_err());
    }

    #[test]
    fn dangling_child_ids_are_skipped() {
        let (mut corpus, doc, entity) = customer();
        corpus.entity_mut(entity).unwrap().exhibits_traits.push(NodeId(99));

        let paths = collect_paths(&mut corpus, doc, VisitOptions::default());
        assert_eq!(paths.len(), 6);
        assert!(paths.contains(&"Customer/hasAttributes/name".to_string()));
        assert_eq!(corpus.subtree(entity).unwrap().len(), 5);
    }

    #[test]
    fn child_that_is_an_ancestor_is_not_revisited() {
        let (mut corpus, doc, entity) = customer();
        corpus.entity_mut(entity).unwrap().attributes.push(entity);

        let paths = collect_paths(&mut corpus, doc, VisitOptions::default());
        assert_eq!(paths.len(), 6);
        assert_eq!(corpus.subtree(doc).unwrap().len(), 6);
    }
}
