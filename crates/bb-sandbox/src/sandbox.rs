//! The host side of a sandbox: spawn, post messages, tear down.

use crate::console::ConsoleSink;
use crate::protocol::SandboxMessage;
use crate::worker;
use bb_core::BlockId;
use std::thread::JoinHandle;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

// ─── Config ───────────────────────────────────────────────────────────────

/// Per-sandbox resource limits and the optional console tap.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// VM instructions one execution may use. `None` = unbounded.
    /// Default: **10 million**.
    pub instruction_limit: Option<u64>,

    /// Lua heap limit in bytes. `None` = unbounded. Default: **16 MiB**.
    pub memory_limit: Option<usize>,

    /// Receives `print` output and caught failures. Default: none.
    pub console: Option<ConsoleSink>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            instruction_limit: Some(10_000_000),
            memory_limit: Some(16 * 1024 * 1024),
            console: None,
        }
    }
}

// ─── Sandbox ──────────────────────────────────────────────────────────────

/// Lifecycle of one sandbox, as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    /// Spawned, no script sent yet.
    Created,
    /// At least one LOAD_SCRIPT sent. Executions never leave this state.
    Ready,
    /// Torn down; further calls are ignored.
    Destroyed,
}

/// Host handle to one isolated script context.
///
/// Every method is fire-and-forget: none blocks on the worker (except
/// `destroy`, which waits for it to finish) and none reports script
/// success or failure.
pub struct ScriptSandbox {
    block_id: BlockId,
    state: SandboxState,
    outbox: Option<UnboundedSender<Vec<u8>>>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptSandbox {
    /// Start a sandbox for `block_id`. When `script` is given it is sent as
    /// the first LOAD_SCRIPT, ahead of any possible EXECUTE_SCRIPT.
    pub fn spawn(block_id: BlockId, script: Option<&str>, config: SandboxConfig) -> Self {
        let (outbox, inbox) = unbounded_channel();
        let worker = match worker::spawn(block_id, config, inbox) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("could not start sandbox thread for {block_id:?}: {e}");
                None
            }
        };

        let mut sandbox = Self {
            block_id,
            state: SandboxState::Created,
            outbox: Some(outbox),
            worker,
        };
        if let Some(script) = script {
            sandbox.notify_script_changed(script);
        }
        log::debug!("sandbox {block_id:?} mounted");
        sandbox
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn state(&self) -> SandboxState {
        self.state
    }

    /// LOAD_SCRIPT: replace the script the next execution will run.
    pub fn notify_script_changed(&mut self, script: &str) {
        let msg = SandboxMessage::LoadScript {
            script: script.to_string(),
        };
        if self.post(&msg) {
            self.state = SandboxState::Ready;
        }
    }

    /// EXECUTE_SCRIPT: run the latest script once.
    pub fn trigger(&self) {
        self.post(&SandboxMessage::ExecuteScript);
    }

    /// Stop the worker and wait for it to drain. Idempotent.
    pub fn destroy(&mut self) {
        if self.state == SandboxState::Destroyed {
            return;
        }
        self.post(&SandboxMessage::Shutdown);
        self.outbox = None;
        self.state = SandboxState::Destroyed;
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            log::error!("sandbox {:?} worker panicked", self.block_id);
        }
        log::debug!("sandbox {:?} destroyed", self.block_id);
    }

    /// Encode and enqueue. Returns whether the message left the host.
    fn post(&self, msg: &SandboxMessage) -> bool {
        let Some(outbox) = &self.outbox else {
            log::debug!("sandbox {:?} is destroyed; {msg:?} ignored", self.block_id);
            return false;
        };
        let bytes = match msg.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("sandbox {:?}: could not encode {msg:?}: {e}", self.block_id);
                return false;
            }
        };
        if outbox.send(bytes).is_err() {
            log::debug!("sandbox {:?} worker is gone; {msg:?} dropped", self.block_id);
            return false;
        }
        true
    }
}

impl Drop for ScriptSandbox {
    /// Ask the worker to stop without waiting for it.
    fn drop(&mut self) {
        if self.state != SandboxState::Destroyed {
            self.post(&SandboxMessage::Shutdown);
        }
    }
}

impl std::fmt::Debug for ScriptSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptSandbox")
            .field("block_id", &self.block_id)
            .field("state", &self.state)
            .finish()
    }
}
