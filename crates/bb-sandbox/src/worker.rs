//! The sandbox side: a thread that owns one Lua state and drains messages.

use crate::console::{ConsoleEntry, ConsoleLevel, ConsoleSink};
use crate::protocol::SandboxMessage;
use crate::sandbox::SandboxConfig;
use bb_core::BlockId;
use mlua::{Function, HookTriggers, Lua, LuaOptions, StdLib, Value, Variadic, VmState};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedReceiver;

/// How often (in VM instructions) the budget hook runs.
pub const INSTRUCTION_HOOK_INTERVAL: u32 = 1_000;

const LOG_TARGET: &str = "bb_sandbox::script";

/// Start the worker thread for `block_id`.
pub(crate) fn spawn(
    block_id: BlockId,
    config: SandboxConfig,
    inbox: UnboundedReceiver<Vec<u8>>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("bb-sandbox-{}", block_id.short(8)))
        .spawn(move || run(block_id, config, inbox))
}

fn run(block_id: BlockId, config: SandboxConfig, mut inbox: UnboundedReceiver<Vec<u8>>) {
    let mut worker = match Worker::new(block_id, &config) {
        Ok(w) => w,
        Err(e) => {
            log::error!("sandbox for {block_id:?} failed to start: {e}");
            return;
        }
    };

    while let Some(bytes) = inbox.blocking_recv() {
        let msg = match SandboxMessage::decode(&bytes) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("sandbox {block_id:?} dropped an undecodable message: {e}");
                continue;
            }
        };
        log::trace!("sandbox {block_id:?} <- {msg:?}");
        match msg {
            SandboxMessage::LoadScript { script } => worker.script = Some(script),
            SandboxMessage::ExecuteScript => worker.execute(),
            SandboxMessage::Shutdown => break,
        }
    }

    log::debug!("sandbox {block_id:?} stopped");
}

struct Worker {
    block_id: BlockId,
    lua: Lua,
    /// Latest loaded script; `None` until the first LOAD_SCRIPT.
    script: Option<String>,
    /// Instructions used by the current execution, in hook-interval steps.
    instructions: Arc<AtomicU64>,
    console: Option<ConsoleSink>,
}

impl Worker {
    fn new(block_id: BlockId, config: &SandboxConfig) -> mlua::Result<Self> {
        // No io, os, package, or debug: scripts cannot reach files,
        // processes, or native modules.
        let lua = Lua::new_with(
            StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE,
            LuaOptions::new(),
        )?;
        let globals = lua.globals();
        globals.set("dofile", Value::Nil)?;
        globals.set("loadfile", Value::Nil)?;

        if let Some(bytes) = config.memory_limit {
            lua.set_memory_limit(bytes)?;
        }

        let instructions = Arc::new(AtomicU64::new(0));
        if let Some(limit) = config.instruction_limit {
            let used = Arc::clone(&instructions);
            lua.set_hook(
                HookTriggers::new().every_nth_instruction(INSTRUCTION_HOOK_INTERVAL),
                move |_lua, _debug| {
                    let step = u64::from(INSTRUCTION_HOOK_INTERVAL);
                    if used.fetch_add(step, Ordering::Relaxed) + step > limit {
                        return Err(mlua::Error::runtime(format!(
                            "instruction limit of {limit} exceeded"
                        )));
                    }
                    Ok(VmState::Continue)
                },
            );
        }

        let console = config.console.clone();
        let print_console = console.clone();
        let print = lua.create_function(move |lua, args: Variadic<Value>| {
            let tostring: Function = lua.globals().get("tostring")?;
            let mut parts = Vec::with_capacity(args.len());
            for value in args.iter() {
                parts.push(tostring.call::<String>(value.clone())?);
            }
            let line = parts.join("\t");
            log::info!(target: LOG_TARGET, "[{block_id}] {line}");
            if let Some(sink) = &print_console {
                let _ = sink.send(ConsoleEntry {
                    block_id,
                    level: ConsoleLevel::Log,
                    message: line,
                });
            }
            Ok(())
        })?;
        globals.set("print", print)?;

        Ok(Self {
            block_id,
            lua,
            script: None,
            instructions,
            console,
        })
    }

    /// Compile the latest script into a function and call it once.
    /// Every failure stops here.
    fn execute(&self) {
        let Some(script) = self.script.as_deref() else {
            log::debug!("sandbox {:?} triggered before any script loaded", self.block_id);
            return;
        };

        self.instructions.store(0, Ordering::Relaxed);
        let result = self
            .lua
            .load(script)
            .set_name(format!("onClick@{}", self.block_id))
            .into_function()
            .and_then(|f| f.call::<()>(()));

        if let Err(e) = result {
            let message = e.to_string();
            log::warn!(target: LOG_TARGET, "[{}] script failed: {message}", self.block_id);
            if let Some(sink) = &self.console {
                let _ = sink.send(ConsoleEntry {
                    block_id: self.block_id,
                    level: ConsoleLevel::Error,
                    message,
                });
            }
        }
    }
}
