//! Core data model for Block Builder pages.
//!
//! A page is a flat, insertion-ordered mapping from `BlockId` to `Block`.
//! Parent/child structure lives only in each block's `parent_id`; the tree
//! is derived on demand by `hierarchy::build_hierarchy` and never stored.
//! Pages are values: every mutation returns a new `Page` that shares the
//! untouched blocks through `Arc`.

use crate::hierarchy::{Hierarchy, build_hierarchy};
use crate::id::BlockId;
use crate::ops::{self, BlockPatch, ValidationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ─── Styles ──────────────────────────────────────────────────────────────

/// Free-form style properties. Always present on a block, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Styles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
}

impl Styles {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.background_color.is_none() && self.font_size.is_none()
    }
}

// ─── Block variants ──────────────────────────────────────────────────────

/// Fieldless discriminant of `BlockKind`, as it appears in the `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Button,
    Paragraph,
    Image,
    Division,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [
        BlockType::Button,
        BlockType::Paragraph,
        BlockType::Image,
        BlockType::Division,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Button => "button",
            BlockType::Paragraph => "paragraph",
            BlockType::Image => "image",
            BlockType::Division => "division",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block type `{0}` (expected button, paragraph, image or division)")]
pub struct UnknownBlockType(pub String);

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}

/// Variant-specific block data, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Button {
        text: String,
        /// Script source run in the block's sandbox when clicked.
        #[serde(rename = "onClick", default, skip_serializing_if = "Option::is_none")]
        on_click: Option<String>,
    },
    Paragraph {
        text: String,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    /// Container, the only variant allowed to parent other blocks.
    Division,
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Button { .. } => BlockType::Button,
            BlockKind::Paragraph { .. } => BlockType::Paragraph,
            BlockKind::Image { .. } => BlockType::Image,
            BlockKind::Division => BlockType::Division,
        }
    }
}

/// A single UI element on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    pub styles: Styles,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            parent_id: None,
            styles: Styles::default(),
            kind,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    /// Only divisions may have children.
    pub fn is_parentable(&self) -> bool {
        matches!(self.kind, BlockKind::Division)
    }

    /// The button's script, if this is a button carrying one.
    pub fn script(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Button { on_click, .. } => on_click.as_deref(),
            _ => None,
        }
    }
}

// ─── Page ────────────────────────────────────────────────────────────────

/// The top-level document: a name plus every block keyed by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub blocks: IndexMap<BlockId, Arc<Block>>,
}

impl Page {
    /// Create an empty page.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: IndexMap::new(),
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id).map(|b| b.as_ref())
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values().map(|b| b.as_ref())
    }

    /// A generated id not already used on this page.
    pub fn fresh_id(&self) -> BlockId {
        loop {
            let id = BlockId::generate();
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// Return a copy of this page with `block` inserted (or replaced) under its id.
    #[must_use]
    pub fn with_block(&self, block: Block) -> Page {
        let mut next = self.clone();
        next.blocks.insert(block.id, Arc::new(block));
        next
    }

    /// Return a copy of this page without `id`. Children of the removed
    /// block keep their now-dangling `parent_id`.
    #[must_use]
    pub fn without_block(&self, id: BlockId) -> Page {
        let mut next = self.clone();
        if next.blocks.shift_remove(&id).is_none() {
            log::debug!("remove of unknown block {id:?} ignored");
        }
        next
    }

    /// Create a default block of type `ty` and insert it.
    /// An ineligible `parent` is demoted to a root rather than rejected.
    #[must_use]
    pub fn add_block(&self, ty: BlockType, parent: Option<BlockId>) -> (Page, BlockId) {
        let block = ops::new_block(self, ty, self.fresh_id(), parent);
        let id = block.id;
        (self.with_block(block), id)
    }

    /// Merge `patch` onto block `id` and re-validate it. On error the page
    /// is left as it was; the caller keeps using `self`.
    pub fn update_block(&self, id: BlockId, patch: &BlockPatch) -> Result<Page, ValidationError> {
        let existing = self.get(id).ok_or(ValidationError::UnknownBlock(id))?;
        let updated = ops::update_block(existing, patch)?;
        Ok(self.with_block(updated))
    }

    /// Build the render/navigation forest for the current snapshot.
    pub fn hierarchy(&self) -> Hierarchy {
        build_hierarchy(self.iter())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new("New Page")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_wire_shape() {
        let mut block = Block::new(
            BlockId::intern("b1"),
            BlockKind::Button {
                text: "Go".into(),
                on_click: Some("x = 1".into()),
            },
        );
        block.parent_id = Some(BlockId::intern("d1"));
        block.styles.background_color = Some("red".into());

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "b1",
                "parentId": "d1",
                "styles": { "backgroundColor": "red" },
                "type": "button",
                "text": "Go",
                "onClick": "x = 1",
            })
        );
    }

    #[test]
    fn division_has_only_common_fields() {
        let block = Block::new(BlockId::intern("d1"), BlockKind::Division);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "d1", "styles": {}, "type": "division" })
        );
        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn styles_are_required_on_the_wire() {
        let json = serde_json::json!({ "id": "p1", "type": "paragraph", "text": "hi" });
        assert!(serde_json::from_value::<Block>(json).is_err());
    }

    #[test]
    fn block_type_parse() {
        assert_eq!("image".parse::<BlockType>().unwrap(), BlockType::Image);
        assert!("span".parse::<BlockType>().is_err());
    }

    #[test]
    fn mutations_share_untouched_blocks() {
        let (page, a) = Page::new("p").add_block(BlockType::Paragraph, None);
        let (next, _) = page.add_block(BlockType::Image, None);

        assert_eq!(page.len(), 1);
        assert_eq!(next.len(), 2);
        assert!(Arc::ptr_eq(&page.blocks[&a], &next.blocks[&a]));
    }

    #[test]
    fn without_block_keeps_order_and_orphans() {
        let (page, div) = Page::new("p").add_block(BlockType::Division, None);
        let (page, child) = page.add_block(BlockType::Paragraph, Some(div));
        let (page, tail) = page.add_block(BlockType::Image, None);

        let page = page.without_block(div);
        let ids: Vec<BlockId> = page.blocks.keys().copied().collect();
        assert_eq!(ids, vec![child, tail]);
        assert_eq!(page.get(child).unwrap().parent_id, Some(div));
    }
}
