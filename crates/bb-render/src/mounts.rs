//! Sandbox lifecycle for rendered buttons.
//!
//! A rendered button owns exactly one sandbox for as long as it stays
//! mounted. `ScriptMounts::sync` reconciles the mounted set with a new
//! snapshot: newly rendered buttons spawn a sandbox, changed `onClick` text is sent
//! as LOAD_SCRIPT, and buttons that left the tree are torn down.

use bb_core::hierarchy::Hierarchy;
use bb_core::id::BlockId;
use bb_core::model::BlockKind;
use bb_sandbox::{SandboxConfig, SandboxState, ScriptSandbox};
use std::collections::{HashMap, HashSet};

struct Mounted {
    sandbox: ScriptSandbox,
    /// The script last sent to the sandbox.
    script: Option<String>,
}

/// Mounted sandboxes, keyed by button id. Sandboxes are never shared.
pub struct ScriptMounts {
    config: SandboxConfig,
    mounted: HashMap<BlockId, Mounted>,
}

impl ScriptMounts {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            mounted: HashMap::new(),
        }
    }

    /// Reconcile with the buttons `render_html` would display.
    pub fn sync(&mut self, hierarchy: &Hierarchy) {
        let mut live = HashSet::new();

        for (_, idx) in hierarchy.walk_rendered() {
            let block = &hierarchy.node(idx).block;
            let BlockKind::Button { on_click, .. } = &block.kind else {
                continue;
            };
            live.insert(block.id);

            match self.mounted.get_mut(&block.id) {
                Some(mounted) => {
                    if mounted.script != *on_click {
                        mounted
                            .sandbox
                            .notify_script_changed(on_click.as_deref().unwrap_or(""));
                        mounted.script = on_click.clone();
                    }
                }
                None => {
                    let sandbox =
                        ScriptSandbox::spawn(block.id, on_click.as_deref(), self.config.clone());
                    self.mounted.insert(
                        block.id,
                        Mounted {
                            sandbox,
                            script: on_click.clone(),
                        },
                    );
                }
            }
        }

        self.mounted.retain(|id, mounted| {
            if live.contains(id) {
                return true;
            }
            mounted.sandbox.destroy();
            false
        });
    }

    /// Deliver a click. Returns `false` when no sandbox is mounted for `id`.
    pub fn click(&self, id: BlockId) -> bool {
        match self.mounted.get(&id) {
            Some(mounted) => {
                mounted.sandbox.trigger();
                true
            }
            None => {
                log::debug!("click on {id:?} ignored: no mounted button");
                false
            }
        }
    }

    pub fn state(&self, id: BlockId) -> Option<SandboxState> {
        self.mounted.get(&id).map(|m| m.sandbox.state())
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Destroy every sandbox, waiting for each worker to finish.
    pub fn unmount_all(&mut self) {
        for (_, mut mounted) in self.mounted.drain() {
            mounted.sandbox.destroy();
        }
    }
}
