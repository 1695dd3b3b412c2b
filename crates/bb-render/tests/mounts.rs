//! Integration tests: page snapshots → mounted button sandboxes.

use bb_core::model::{BlockType, Page};
use bb_core::ops::BlockPatch;
use bb_render::{ScriptMounts, render_html};
use bb_sandbox::{ConsoleEntry, ConsoleLevel, SandboxConfig, SandboxState, console_channel};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::UnboundedReceiver;

fn mounts() -> (ScriptMounts, UnboundedReceiver<ConsoleEntry>) {
    let (sink, rx) = console_channel();
    let config = SandboxConfig {
        console: Some(sink),
        ..Default::default()
    };
    (ScriptMounts::new(config), rx)
}

fn drain_logs(rx: &mut UnboundedReceiver<ConsoleEntry>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        if entry.level == ConsoleLevel::Log {
            out.push(entry.message);
        }
    }
    out
}

#[test]
fn one_sandbox_per_rendered_button() {
    let (page, div) = Page::default().add_block(BlockType::Division, None);
    let (page, a) = page.add_block(BlockType::Button, Some(div));
    let (page, b) = page.add_block(BlockType::Button, None);
    let (page, para) = page.add_block(BlockType::Paragraph, None);

    let (mut mounts, _rx) = mounts();
    mounts.sync(&page.hierarchy());

    assert_eq!(mounts.len(), 2);
    assert_eq!(mounts.state(a), Some(SandboxState::Created));
    assert_eq!(mounts.state(b), Some(SandboxState::Created));
    assert_eq!(mounts.state(para), None);
    assert!(!mounts.click(para));
    mounts.unmount_all();
    assert!(mounts.is_empty());
}

#[test]
fn script_edits_reach_the_mounted_sandbox() {
    let (page, btn) = Page::default().add_block(BlockType::Button, None);
    let page = page
        .update_block(btn, &BlockPatch::new().on_click(Some("print('v1')")))
        .unwrap();

    let (mut mounts, mut rx) = mounts();
    mounts.sync(&page.hierarchy());
    assert_eq!(mounts.state(btn), Some(SandboxState::Ready));
    assert!(mounts.click(btn));

    let page = page
        .update_block(btn, &BlockPatch::new().on_click(Some("print('v2')")))
        .unwrap();
    mounts.sync(&page.hierarchy());
    assert!(mounts.click(btn));

    mounts.unmount_all();
    assert_eq!(drain_logs(&mut rx), vec!["v1", "v2"]);
}

#[test]
fn buttons_nested_under_leaf_blocks_are_not_mounted() {
    let (page, para) = Page::default().add_block(BlockType::Paragraph, None);
    let (page, btn) = page.add_block(BlockType::Button, None);
    // The model only demotes ineligible parents on add; an update can
    // still point a button at a paragraph.
    let page = page
        .update_block(btn, &BlockPatch::new().parent(Some(para)))
        .unwrap();

    let hierarchy = page.hierarchy();
    assert!(!render_html(&hierarchy).contains("<button"));

    let (mut mounts, _rx) = mounts();
    mounts.sync(&hierarchy);
    assert!(mounts.is_empty());
    assert_eq!(mounts.state(btn), None);
    assert!(!mounts.click(btn));
}

#[test]
fn moving_a_button_out_of_view_unmounts_it() {
    let (page, div) = Page::default().add_block(BlockType::Division, None);
    let (page, btn) = page.add_block(BlockType::Button, Some(div));
    let (page, img) = page.add_block(BlockType::Image, None);

    let (mut mounts, _rx) = mounts();
    mounts.sync(&page.hierarchy());
    assert_eq!(mounts.state(btn), Some(SandboxState::Created));

    let page = page
        .update_block(btn, &BlockPatch::new().parent(Some(img)))
        .unwrap();
    mounts.sync(&page.hierarchy());
    assert!(mounts.is_empty());
}

#[test]
fn removed_buttons_are_unmounted() {
    let (page, btn) = Page::default().add_block(BlockType::Button, None);
    let (mut mounts, _rx) = mounts();
    mounts.sync(&page.hierarchy());
    assert_eq!(mounts.len(), 1);

    let page = page.without_block(btn);
    mounts.sync(&page.hierarchy());
    assert!(mounts.is_empty());
    assert!(!mounts.click(btn));
}

#[test]
fn failing_click_leaves_other_buttons_working() {
    let (page, bad) = Page::default().add_block(BlockType::Button, None);
    let (page, good) = page.add_block(BlockType::Button, None);
    let page = page
        .update_block(bad, &BlockPatch::new().on_click(Some("error('boom')")))
        .unwrap()
        .update_block(good, &BlockPatch::new().on_click(Some("print('ok')")))
        .unwrap();

    let (mut mounts, mut rx) = mounts();
    mounts.sync(&page.hierarchy());
    assert!(mounts.click(bad));
    assert!(mounts.click(good));
    mounts.unmount_all();

    assert_eq!(drain_logs(&mut rx), vec!["ok"]);
}
