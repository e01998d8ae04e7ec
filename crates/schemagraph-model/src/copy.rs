//! Deep copies of subtrees

use crate::error::{ModelError, Result};
use crate::node::Node;
use crate::options::ResolveOptions;
use crate::{Corpus, NodeId};
use ahash::AHashMap;

impl Corpus {
    /// Deep-copy the subtree rooted at `id`.
    ///
    /// Every descendant gets a fresh node; owners inside the copy point at
    /// copied parents. With `host`, the copy is written over that node, which
    /// keeps its own owner and must be of the same kind; children the host
    /// held before are detached. Without it the copy is detached. Field
    /// values, timestamps included, are cloned as they are; declared paths
    /// start uncomputed.
    pub fn copy(&mut self, id: NodeId, res_opt: Option<&ResolveOptions>, host: Option<NodeId>) -> Result<NodeId> {
        let source = self.node(id)?.object_type();
        if let Some(host) = host {
            let found = self.node(host)?.object_type();
            if found != source {
                return Err(ModelError::HostMismatch {
                    host,
                    expected: source,
                    found,
                });
            }
        }
        tracing::trace!(
            node = %id,
            host = ?host,
            wrt_doc = ?res_opt.and_then(|o| o.wrt_doc),
            "copying subtree"
        );

        let displaced = match host {
            Some(host) => self.node_unchecked(host).kind().child_ids(),
            None => Vec::new(),
        };

        let order = self.subtree(id)?;
        let mut map = AHashMap::with_capacity(order.len());
        for &old in &order {
            let new = match host {
                Some(host) if old == id => host,
                _ => {
                    let placeholder = Node::new(self.node_unchecked(old).kind().clone());
                    self.push_node(placeholder)
                }
            };
            map.insert(old, new);
        }

        let root_owner = host.and_then(|host| self.node_unchecked(host).owner());
        for &old in &order {
            let new = map[&old];
            let mut kind = self.node_unchecked(old).kind().clone();
            kind.remap_children(&map);
            let children = kind.child_ids();

            // pre-order: every inner node was already claimed by its parent
            let owner = if old == id {
                root_owner
            } else {
                self.node_unchecked(new).owner()
            };
            let mut node = Node::new(kind);
            node.owner = owner;
            self.replace_node(new, node);
            for child in children {
                if let Some(child) = self.get_mut(child) {
                    child.owner = Some(new);
                }
            }
        }

        if let Some(host) = host {
            let kept = self.node_unchecked(host).kind().child_ids();
            for old in displaced.into_iter().filter(|old| !kept.contains(old)) {
                if let Some(node) = self.get_mut(old).filter(|node| node.owner == Some(host)) {
                    node.owner = None;
                }
            }
        }

        Ok(map[&id])
    }
}
