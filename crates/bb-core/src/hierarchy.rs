//! Flat map → forest reconstruction.
//!
//! Blocks only know their `parent_id`. The builder turns a flat collection
//! into an arena of nodes whose children are index lists, in two passes:
//! first every block gets a node, then every block is attached to its
//! parent's node or, failing that, to the root list. Each node is attached
//! exactly once, so the pass terminates on any input, including dangling
//! references and parent cycles.
//!
//! Anomalies are normalised, never raised:
//! - a `parent_id` that names no block in the collection → root
//! - a `parent_id` equal to the block's own id → root
//! - a cycle `a → b → c → a` → each member is the child of its parent, no
//!   member is a root, and the whole cycle is unreachable from the roots
//!   (reported by `Hierarchy::detached`).

use crate::id::BlockId;
use crate::model::Block;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;

/// One arena slot.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub block: Block,
    /// Arena index of the resolved parent, `None` for roots.
    pub parent: Option<usize>,
    /// Arena indices of the children, in input order.
    pub children: SmallVec<[usize; 4]>,
}

/// The derived forest for one page snapshot.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    roots: Vec<usize>,
    index: HashMap<BlockId, usize>,
    detached: Vec<usize>,
}

/// Owned, recursive view of a subtree. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockWithChildren {
    #[serde(flatten)]
    pub block: Block,
    pub children: Vec<BlockWithChildren>,
}

impl BlockWithChildren {
    /// Number of blocks in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(BlockWithChildren::count).sum::<usize>()
    }
}

/// Build the forest. Root and child order follow input order.
#[must_use]
pub fn build_hierarchy<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Hierarchy {
    let mut nodes: Vec<HierarchyNode> = Vec::new();
    let mut index: HashMap<BlockId, usize> = HashMap::new();

    for block in blocks {
        let idx = nodes.len();
        if index.contains_key(&block.id) {
            log::warn!(
                "duplicate block id {:?}; later copies never become parents",
                block.id
            );
        } else {
            index.insert(block.id, idx);
        }
        nodes.push(HierarchyNode {
            block: block.clone(),
            parent: None,
            children: SmallVec::new(),
        });
    }

    let mut roots = Vec::new();
    for idx in 0..nodes.len() {
        let block = &nodes[idx].block;
        let parent = match block.parent_id {
            Some(p) if p == block.id => {
                log::debug!("{:?} names itself as parent; treated as root", block.id);
                None
            }
            Some(p) => index.get(&p).copied(),
            None => None,
        };
        match parent {
            Some(p) => {
                nodes[p].children.push(idx);
                nodes[idx].parent = Some(p);
            }
            None => roots.push(idx),
        }
    }

    let mut hierarchy = Hierarchy {
        nodes,
        roots,
        index,
        detached: Vec::new(),
    };
    hierarchy.detached = hierarchy.find_detached();
    if !hierarchy.detached.is_empty() {
        let ids: Vec<BlockId> = hierarchy.detached().map(|b| b.id).collect();
        log::warn!("parent cycle: {ids:?} unreachable from any root");
    }
    hierarchy
}

impl Hierarchy {
    /// Total number of blocks in the arena (always equals the input length).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Arena indices of root blocks, in input order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn node(&self, idx: usize) -> &HierarchyNode {
        &self.nodes[idx]
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].children
    }

    /// Arena index for a block id.
    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn get(&self, id: BlockId) -> Option<&HierarchyNode> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    /// Root blocks as values.
    pub fn root_blocks(&self) -> impl Iterator<Item = &Block> {
        self.roots.iter().map(|&idx| &self.nodes[idx].block)
    }

    /// Blocks that no root reaches: parent-cycle members and their descendants.
    pub fn detached(&self) -> impl Iterator<Item = &Block> {
        self.detached.iter().map(|&idx| &self.nodes[idx].block)
    }

    /// Pre-order traversal from the roots, yielding `(depth, arena index)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            hierarchy: self,
            stack: self.roots.iter().rev().map(|&idx| (0, idx)).collect(),
            containers_only: false,
        }
    }

    /// Like `walk`, but only descends through divisions: the blocks a page
    /// actually displays. Children of any other block are data only.
    pub fn walk_rendered(&self) -> Walk<'_> {
        Walk {
            containers_only: true,
            ..self.walk()
        }
    }

    /// Owned trees for every root.
    pub fn to_trees(&self) -> Vec<BlockWithChildren> {
        self.roots.iter().map(|&idx| self.subtree(idx)).collect()
    }

    fn subtree(&self, idx: usize) -> BlockWithChildren {
        let node = &self.nodes[idx];
        BlockWithChildren {
            block: node.block.clone(),
            children: node.children.iter().map(|&c| self.subtree(c)).collect(),
        }
    }

    fn find_detached(&self) -> Vec<usize> {
        let mut reached = vec![false; self.nodes.len()];
        for (_, idx) in self.walk() {
            reached[idx] = true;
        }
        reached
            .iter()
            .enumerate()
            .filter(|(_, r)| !**r)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Iterative pre-order walk; see `Hierarchy::walk`.
pub struct Walk<'a> {
    hierarchy: &'a Hierarchy,
    stack: Vec<(usize, usize)>,
    containers_only: bool,
}

impl Iterator for Walk<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, idx) = self.stack.pop()?;
        let node = self.hierarchy.node(idx);
        if !self.containers_only || node.block.is_parentable() {
            self.stack
                .extend(node.children.iter().rev().map(|&c| (depth + 1, c)));
        }
        Some((depth, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;
    use pretty_assertions::assert_eq;

    fn block(id: &str, parent: Option<&str>, kind: BlockKind) -> Block {
        let mut b = Block::new(BlockId::intern(id), kind);
        b.parent_id = parent.map(BlockId::intern);
        b
    }

    fn div(id: &str, parent: Option<&str>) -> Block {
        block(id, parent, BlockKind::Division)
    }

    fn para(id: &str, parent: Option<&str>) -> Block {
        block(id, parent, BlockKind::Paragraph { text: id.into() })
    }

    fn root_ids(h: &Hierarchy) -> Vec<&str> {
        h.root_blocks().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn nests_children_in_input_order() {
        let blocks = [
            div("outer", None),
            para("second", Some("outer")),
            div("inner", Some("outer")),
            para("leaf", Some("inner")),
            para("first_root_para", None),
        ];
        let h = build_hierarchy(&blocks);

        assert_eq!(root_ids(&h), vec!["outer", "first_root_para"]);
        let outer = h.index_of(BlockId::intern("outer")).unwrap();
        let kids: Vec<&str> = h
            .children(outer)
            .iter()
            .map(|&c| h.node(c).block.id.as_str())
            .collect();
        assert_eq!(kids, vec!["second", "inner"]);

        let walked: Vec<(usize, &str)> = h
            .walk()
            .map(|(d, i)| (d, h.node(i).block.id.as_str()))
            .collect();
        assert_eq!(
            walked,
            vec![
                (0, "outer"),
                (1, "second"),
                (1, "inner"),
                (2, "leaf"),
                (0, "first_root_para"),
            ]
        );
    }

    #[test]
    fn child_listed_before_parent_still_nests() {
        let blocks = [para("kid", Some("box")), div("box", None)];
        let h = build_hierarchy(&blocks);
        assert_eq!(root_ids(&h), vec!["box"]);
        assert_eq!(h.to_trees()[0].children[0].block.id.as_str(), "kid");
    }

    #[test]
    fn dangling_parent_is_root() {
        let blocks = [para("orphan", Some("deleted"))];
        let h = build_hierarchy(&blocks);
        assert_eq!(root_ids(&h), vec!["orphan"]);
    }

    #[test]
    fn self_parent_is_root() {
        let blocks = [div("me", Some("me"))];
        let h = build_hierarchy(&blocks);
        assert_eq!(root_ids(&h), vec!["me"]);
        assert!(h.children(0).is_empty());
        assert_eq!(h.detached().count(), 0);
    }

    #[test]
    fn non_division_parent_still_nests() {
        // Existence is the only check; the division rule belongs to `add`.
        let blocks = [para("host", None), para("guest", Some("host"))];
        let h = build_hierarchy(&blocks);
        assert_eq!(root_ids(&h), vec!["host"]);
        assert_eq!(h.to_trees()[0].count(), 2);
    }

    #[test]
    fn cycle_is_flattened_and_detached() {
        let blocks = [
            div("a", Some("c")),
            div("b", Some("a")),
            div("c", Some("b")),
            para("free", None),
        ];
        let h = build_hierarchy(&blocks);

        assert_eq!(root_ids(&h), vec!["free"]);
        assert_eq!(h.len(), 4);
        let detached: Vec<&str> = h.detached().map(|b| b.id.as_str()).collect();
        assert_eq!(detached, vec!["a", "b", "c"]);
        for id in ["a", "b", "c"] {
            let node = h.get(BlockId::intern(id)).unwrap();
            assert!(node.parent.is_some());
            assert_eq!(node.children.len(), 1);
        }
    }

    #[test]
    fn trees_serialise_with_children() {
        let blocks = [div("wrap", None), para("txt", Some("wrap"))];
        let trees = build_hierarchy(&blocks).to_trees();
        let json = serde_json::to_value(&trees).unwrap();
        assert_eq!(json[0]["type"], "division");
        assert_eq!(json[0]["children"][0]["text"], "txt");
        assert_eq!(json[0]["children"][0]["children"], serde_json::json!([]));
    }

    #[test]
    fn empty_input() {
        let h = build_hierarchy(std::iter::empty::<&Block>());
        assert!(h.is_empty());
        assert!(h.to_trees().is_empty());
    }

    #[test]
    fn rendered_walk_skips_children_of_leaves() {
        let blocks = [
            div("box", None),
            para("caption", Some("box")),
            para("note", None),
            block(
                "hidden",
                Some("note"),
                BlockKind::Button {
                    text: "x".into(),
                    on_click: None,
                },
            ),
        ];
        let h = build_hierarchy(&blocks);
        let ids = |walk: Walk<'_>| {
            walk.map(|(_, idx)| h.node(idx).block.id.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(h.walk()), vec!["box", "caption", "note", "hidden"]);
        assert_eq!(ids(h.walk_rendered()), vec!["box", "caption", "note"]);
        assert_eq!(h.detached().count(), 0);
    }
}
