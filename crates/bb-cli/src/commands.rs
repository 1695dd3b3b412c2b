//! Command bodies. Each takes the encoded page and returns what `bb`
//! prints on success.

use bb_core::codec::{decode_page, encode_page, page_to_json};
use bb_core::id::BlockId;
use bb_core::lint::{LintSeverity, lint_page};
use bb_core::model::{BlockType, Page};
use bb_core::ops::BlockPatch;
use bb_editor::{EditorConfig, EditorSession, MemoryPort};
use bb_render::{ScriptMounts, render_html};
use bb_sandbox::{ConsoleLevel, SandboxConfig, console_channel};

pub fn new_page(name: &str) -> String {
    encode_page(&Page::new(name))
}

pub fn add(data: &str, ty: BlockType, parent: Option<&str>) -> Result<(String, BlockId), String> {
    let page = load(data)?;
    let (page, id) = page.add_block(ty, parent.map(BlockId::intern));
    Ok((encode_page(&page), id))
}

pub fn update(data: &str, id: &str, patch: &str) -> Result<String, String> {
    let page = load(data)?;
    let value: serde_json::Value =
        serde_json::from_str(patch).map_err(|e| format!("patch is not JSON: {e}"))?;
    let patch = BlockPatch::from_json(value).ok_or("patch must be a JSON object")?;
    let page = page
        .update_block(BlockId::intern(id), &patch)
        .map_err(|e| e.to_string())?;
    Ok(encode_page(&page))
}

pub fn delete(data: &str, id: &str) -> Result<String, String> {
    let page = load(data)?;
    let id = existing(&page, id)?;
    Ok(encode_page(&page.without_block(id)))
}

pub fn tree(data: &str, select: Option<&str>) -> Result<String, String> {
    let page = load(data)?;
    let selected = select.map(|s| existing(&page, s)).transpose()?;

    let json = page_to_json(&page).map_err(|e| format!("cannot serialise page: {e}"))?;
    let mut session = EditorSession::open(MemoryPort::with_state(json), EditorConfig::default());
    if let Some(id) = selected {
        session.select(id);
    }

    let mut out = format!("{}\n", page.name);
    for line in session.tree_lines() {
        out.push_str(&line);
        out.push('\n');
    }
    let detached: Vec<String> = session
        .hierarchy()
        .detached()
        .map(|b| b.id.to_string())
        .collect();
    if !detached.is_empty() {
        out.push_str(&format!("(not shown: {})\n", detached.join(", ")));
    }
    Ok(out)
}

pub fn lint(data: &str) -> Result<String, String> {
    let page = load(data)?;
    let lines: Vec<String> = lint_page(&page)
        .into_iter()
        .map(|d| {
            let severity = match d.severity {
                LintSeverity::Warning => "warning",
                LintSeverity::Info => "info",
            };
            format!("{severity}[{}] {}: {}", d.rule, d.block_id, d.message)
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn render(data: &str) -> Result<String, String> {
    let page = load(data)?;
    Ok(render_html(&page.hierarchy()))
}

/// Mount every rendered button, click `ids` in order, and collect the
/// console output once all sandboxes have shut down.
pub fn click(data: &str, ids: &[String], instruction_limit: Option<u64>) -> Result<String, String> {
    let page = load(data)?;
    let ids = ids
        .iter()
        .map(|id| {
            let id = existing(&page, id)?;
            match page.get(id).map(|b| b.block_type()) {
                Some(BlockType::Button) => Ok(id),
                _ => Err(format!("block `{id}` is not a button")),
            }
        })
        .collect::<Result<Vec<_>, String>>()?;

    let (sink, mut rx) = console_channel();
    let mut config = SandboxConfig {
        console: Some(sink),
        ..Default::default()
    };
    if instruction_limit.is_some() {
        config.instruction_limit = instruction_limit;
    }

    let mut mounts = ScriptMounts::new(config);
    mounts.sync(&page.hierarchy());
    for &id in &ids {
        if !mounts.click(id) {
            log::warn!("button {id:?} is not rendered; click dropped");
        }
    }
    mounts.unmount_all();

    let mut out = String::new();
    while let Ok(entry) = rx.try_recv() {
        let prefix = match entry.level {
            ConsoleLevel::Log => "",
            ConsoleLevel::Error => "error: ",
        };
        out.push_str(&format!("[{}] {prefix}{}\n", entry.block_id, entry.message));
    }
    Ok(out)
}

fn load(data: &str) -> Result<Page, String> {
    decode_page(data).map_err(|e| format!("cannot decode page: {e}"))
}

fn existing(page: &Page, id: &str) -> Result<BlockId, String> {
    let id = BlockId::intern(id);
    if page.contains(id) {
        Ok(id)
    } else {
        Err(format!("no block `{id}` on page `{}`", page.name))
    }
}
