//! Read-only preview of a saved page.
//!
//! Opening never fails: missing data and undecodable data each become an
//! empty page whose name says what went wrong. Scripts only run once the
//! caller mounts sandboxes for the rendered buttons.

use crate::config::EditorConfig;
use crate::port::PersistencePort;
use bb_core::codec::page_from_json;
use bb_core::hierarchy::Hierarchy;
use bb_core::id::BlockId;
use bb_core::model::Page;
use bb_core::percent::percent_encode;
use bb_render::{ScriptMounts, render_html};
use bb_sandbox::SandboxConfig;

pub struct PreviewSession {
    config: EditorConfig,
    /// The page data exactly as loaded, empty when there was none.
    raw: String,
    page: Page,
    hierarchy: Hierarchy,
    mounts: Option<ScriptMounts>,
}

impl PreviewSession {
    pub fn open(port: &impl PersistencePort, config: EditorConfig) -> Self {
        let raw = port.load();
        let page = match raw.as_deref() {
            None => Page::new(config.no_data_page_name.clone()),
            Some(json) => match page_from_json(json) {
                Ok(page) => page,
                Err(e) => {
                    log::warn!("preview could not decode page: {e}");
                    Page::new(config.error_page_name.clone())
                }
            },
        };

        Self {
            hierarchy: page.hierarchy(),
            config,
            raw: raw.unwrap_or_default(),
            page,
            mounts: None,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// True when there are no blocks to show.
    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }

    pub fn render(&self) -> String {
        render_html(&self.hierarchy)
    }

    /// Link back to the editor carrying the data the preview was opened
    /// with, untouched. The placeholder pages shown for missing or broken
    /// data never travel back.
    pub fn back_link(&self) -> String {
        self.config
            .link(&self.config.editor_path, &percent_encode(&self.raw))
    }

    /// Spawn one sandbox per rendered button. Calling again re-syncs.
    pub fn mount(&mut self, sandbox: SandboxConfig) {
        let mounts = self
            .mounts
            .get_or_insert_with(|| ScriptMounts::new(sandbox));
        mounts.sync(&self.hierarchy);
        log::debug!("preview mounted {} button sandboxes", mounts.len());
    }

    /// Forward a click to the button's sandbox. `false` if nothing is
    /// mounted for `id`.
    pub fn click(&self, id: BlockId) -> bool {
        self.mounts.as_ref().is_some_and(|m| m.click(id))
    }

    /// Tear down every sandbox, waiting for in-flight scripts to finish.
    pub fn unmount(&mut self) {
        if let Some(mut mounts) = self.mounts.take() {
            mounts.unmount_all();
        }
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
