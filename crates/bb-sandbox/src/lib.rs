//! Sandboxed execution of button scripts.
//!
//! Each interactive block owns one `ScriptSandbox`: a dedicated worker
//! thread holding its own Lua state. The host talks to it only through
//! two fire-and-forget messages, `LOAD_SCRIPT` and `EXECUTE_SCRIPT`,
//! serialised to bytes before they cross the channel.
//!
//! # Critical Rule
//!
//! **Nothing crosses back.** The worker has no handle on host memory, and
//! no result, error, or panic from a script reaches the host. Failures
//! are logged inside the worker and, if configured, copied to a developer
//! console sink that host logic never reads.

pub mod console;
pub mod protocol;
mod sandbox;
mod worker;

pub use console::{ConsoleEntry, ConsoleLevel, ConsoleSink, console_channel};
pub use protocol::SandboxMessage;
pub use sandbox::{SandboxConfig, SandboxState, ScriptSandbox};
pub use worker::INSTRUCTION_HOOK_INTERVAL;
