//! Block mutations: create with defaults, merge-and-revalidate updates.
//!
//! Updates are expressed on the wire shape (`BlockPatch`) rather than on
//! the typed `Block`, so a patch can remove a required field or carry a
//! value of the wrong type. The merged object is re-deserialised into a
//! `Block`, which is the schema check: anything serde rejects is a
//! `ValidationError` and nothing is committed.

use crate::id::BlockId;
use crate::model::{Block, BlockKind, BlockType, Page, Styles};
use serde::Deserialize;
use serde_json::{Map, Value};

// ─── Errors ──────────────────────────────────────────────────────────────

/// A rejected update. The previous block value stays in place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("block `{0}` does not exist")]
    UnknownBlock(BlockId),

    #[error("block `{id}`: type cannot change from `{from}` to {to}")]
    TypeChange {
        id: BlockId,
        from: BlockType,
        to: String,
    },

    #[error("block `{id}`: the id is the page key and cannot change (got {to})")]
    IdChange { id: BlockId, to: String },

    #[error("block `{id}`: {reason}")]
    Schema { id: BlockId, reason: String },
}

// ─── Patch ───────────────────────────────────────────────────────────────

/// A partial update in wire field names (`text`, `onClick`, `parentId`, ...).
///
/// A `null` value removes the field from the merged block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct BlockPatch {
    fields: Map<String, Value>,
}

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to an arbitrary JSON value.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Remove a field from the merged block.
    #[must_use]
    pub fn unset(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string(), Value::Null);
        self
    }

    #[must_use]
    pub fn text(self, text: &str) -> Self {
        self.set("text", text)
    }

    #[must_use]
    pub fn on_click(self, script: Option<&str>) -> Self {
        match script {
            Some(s) => self.set("onClick", s),
            None => self.unset("onClick"),
        }
    }

    #[must_use]
    pub fn parent(self, parent: Option<BlockId>) -> Self {
        match parent {
            Some(p) => self.set("parentId", p.as_str()),
            None => self.unset("parentId"),
        }
    }

    #[must_use]
    pub fn styles(self, styles: &Styles) -> Self {
        let value = serde_json::to_value(styles).unwrap_or_else(|_| Value::Object(Map::new()));
        self.set("styles", value)
    }

    /// Build a patch from a JSON object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ─── Operations ──────────────────────────────────────────────────────────

/// Construct a default-valued block of type `ty`.
///
/// `parent` is kept only when it names a division currently on `page`;
/// anything else silently makes the new block a root. The block is not
/// inserted; see `Page::add_block`.
pub fn new_block(page: &Page, ty: BlockType, id: BlockId, parent: Option<BlockId>) -> Block {
    let parent_id = parent.filter(|p| {
        let eligible = page.get(*p).is_some_and(Block::is_parentable);
        if !eligible {
            log::debug!("parent {p:?} is not a division on this page; {id:?} added as root");
        }
        eligible
    });

    let kind = match ty {
        BlockType::Button => BlockKind::Button {
            text: "Click me".into(),
            on_click: None,
        },
        BlockType::Paragraph => BlockKind::Paragraph {
            text: "Paragraph text".into(),
        },
        BlockType::Image => BlockKind::Image {
            src: "https://via.placeholder.com/150".into(),
            alt: Some(String::new()),
        },
        BlockType::Division => BlockKind::Division,
    };

    Block {
        id,
        parent_id,
        styles: Styles::default(),
        kind,
    }
}

/// Merge `patch` onto `existing` and validate the result against the
/// schema of `existing`'s variant.
pub fn update_block(existing: &Block, patch: &BlockPatch) -> Result<Block, ValidationError> {
    let id = existing.id;
    let schema_err = |e: serde_json::Error| ValidationError::Schema {
        id,
        reason: e.to_string(),
    };

    let mut merged = match serde_json::to_value(existing).map_err(schema_err)? {
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::Schema {
                id,
                reason: format!("block serialised to non-object {other}"),
            });
        }
    };

    for (field, value) in &patch.fields {
        if value.is_null() {
            merged.remove(field);
        } else {
            merged.insert(field.clone(), value.clone());
        }
    }

    let ty = existing.block_type();
    match merged.get("type") {
        Some(Value::String(t)) if t == ty.as_str() => {}
        other => {
            return Err(ValidationError::TypeChange {
                id,
                from: ty,
                to: other.map_or_else(|| "nothing".to_string(), Value::to_string),
            });
        }
    }
    match merged.get("id") {
        Some(Value::String(s)) if s == id.as_str() => {}
        other => {
            return Err(ValidationError::IdChange {
                id,
                to: other.map_or_else(|| "nothing".to_string(), Value::to_string),
            });
        }
    }

    let block: Block = serde_json::from_value(Value::Object(merged)).map_err(schema_err)?;
    log::trace!("updated {id:?}");
    Ok(block)
}
