//! The editing session: one page snapshot, a selection, and a port.
//!
//! Every mutation produces a new `Page` snapshot, rebuilds the hierarchy
//! from it, and writes the page JSON back through the port. A failed
//! update leaves the snapshot, the hierarchy, and the port untouched.

use crate::config::EditorConfig;
use crate::port::PersistencePort;
use bb_core::codec::{encode_page, page_from_json, page_to_json};
use bb_core::hierarchy::Hierarchy;
use bb_core::id::BlockId;
use bb_core::model::{BlockType, Page};
use bb_core::ops::{BlockPatch, ValidationError};

/// Characters of the id shown in tree lines.
const SHORT_ID_LEN: usize = 6;

pub struct EditorSession<P: PersistencePort> {
    port: P,
    config: EditorConfig,
    page: Page,
    hierarchy: Hierarchy,
    selected: Option<BlockId>,
}

impl<P: PersistencePort> EditorSession<P> {
    /// Restore the saved page, or start a fresh one. The resulting page is
    /// saved immediately so the port always reflects the session.
    pub fn open(port: P, config: EditorConfig) -> Self {
        let fallback = || Page::new(config.default_page_name.clone());
        let page = match port.load() {
            Some(json) => match page_from_json(&json) {
                Ok(page) => page,
                Err(e) => {
                    log::warn!("discarding saved page state: {e}");
                    fallback()
                }
            },
            None => fallback(),
        };
        log::debug!("editor opened `{}` with {} blocks", page.name, page.len());

        let mut session = Self {
            hierarchy: page.hierarchy(),
            port,
            config,
            page,
            selected: None,
        };
        session.persist();
        session
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn selected(&self) -> Option<BlockId> {
        self.selected
    }

    /// Select `id`. Returns `false` (and keeps the selection) if it is not
    /// on the page.
    pub fn select(&mut self, id: BlockId) -> bool {
        if !self.page.contains(id) {
            log::debug!("select of unknown block {id:?} ignored");
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Add a default block of `ty` under the current selection (demoted to
    /// a root if the selection cannot hold children) and select it.
    pub fn add_block(&mut self, ty: BlockType) -> BlockId {
        let (page, id) = self.page.add_block(ty, self.selected);
        self.commit(page);
        self.selected = Some(id);
        id
    }

    pub fn update_block(&mut self, id: BlockId, patch: &BlockPatch) -> Result<(), ValidationError> {
        let page = self.page.update_block(id, patch)?;
        self.commit(page);
        Ok(())
    }

    /// Remove `id`. Children keep their dangling `parentId` and render as
    /// roots. The selection is cleared.
    pub fn delete_block(&mut self, id: BlockId) {
        let page = self.page.without_block(id);
        self.commit(page);
        self.selected = None;
    }

    /// Rename the page.
    pub fn rename(&mut self, name: &str) {
        let mut page = self.page.clone();
        page.name = name.to_string();
        self.commit(page);
    }

    /// One line per reachable block in pre-order: `"{type} - {id}"`,
    /// indented two spaces per depth, the selected block suffixed with `*`.
    pub fn tree_lines(&self) -> Vec<String> {
        self.hierarchy
            .walk()
            .map(|(depth, idx)| {
                let block = &self.hierarchy.node(idx).block;
                let mark = if self.selected == Some(block.id) { " *" } else { "" };
                format!(
                    "{}{} - {}{mark}",
                    "  ".repeat(depth),
                    block.block_type(),
                    block.id.short(SHORT_ID_LEN)
                )
            })
            .collect()
    }

    /// Link that opens the current page in the preview.
    pub fn preview_link(&self) -> String {
        self.config
            .link(&self.config.preview_path, &encode_page(&self.page))
    }

    /// The encoded current page.
    pub fn encoded(&self) -> String {
        encode_page(&self.page)
    }

    pub fn into_port(self) -> P {
        self.port
    }

    fn commit(&mut self, page: Page) {
        self.page = page;
        self.hierarchy = self.page.hierarchy();
        self.persist();
    }

    fn persist(&mut self) {
        match page_to_json(&self.page) {
            Ok(json) => self.port.save(&json),
            Err(e) => log::error!("page `{}` could not be saved: {e}", self.page.name),
        }
    }
}
