//! Developer console tap for sandbox output.

use bb_core::BlockId;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// `print(...)` from a script.
    Log,
    /// A compile or runtime failure caught inside the sandbox.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub block_id: BlockId,
    pub level: ConsoleLevel,
    pub message: String,
}

/// Write end handed to sandboxes through `SandboxConfig::console`.
pub type ConsoleSink = UnboundedSender<ConsoleEntry>;

pub fn console_channel() -> (ConsoleSink, UnboundedReceiver<ConsoleEntry>) {
    unbounded_channel()
}
