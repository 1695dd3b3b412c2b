//! Integration tests: editor → location → preview → editor.

use bb_core::codec::page_to_json;
use bb_core::model::BlockType;
use bb_core::ops::BlockPatch;
use bb_editor::{EditorConfig, EditorSession, LocationPort, MemoryPort, PersistencePort, PreviewSession};
use bb_sandbox::{ConsoleLevel, SandboxConfig, console_channel};
use pretty_assertions::assert_eq;

#[test]
fn editor_state_survives_the_location() {
    let port = LocationPort::new("/", "data").unwrap();
    let mut editor = EditorSession::open(port, EditorConfig::default());
    let div = editor.add_block(BlockType::Division);
    let btn = editor.add_block(BlockType::Button);
    editor
        .update_block(btn, &BlockPatch::new().text("50% off & more"))
        .unwrap();

    let location = editor.port().location().to_string();
    assert!(location.starts_with("/?data=%7B"), "{location}");

    let reopened = EditorSession::open(
        LocationPort::new(&location, "data").unwrap(),
        EditorConfig::default(),
    );
    assert_eq!(reopened.page(), editor.page());
    assert_eq!(reopened.tree_lines().len(), 2);
    assert_eq!(
        reopened.page().get(btn).and_then(|b| b.parent_id),
        Some(div)
    );
}

#[test]
fn preview_link_round_trips_to_back_link() {
    let mut editor = EditorSession::open(MemoryPort::new(), EditorConfig::default());
    editor.add_block(BlockType::Paragraph);
    editor.rename("Landing");

    let link = editor.preview_link();
    assert!(link.starts_with("/preview?data="), "{link}");

    let preview = PreviewSession::open(
        &LocationPort::new(&link, "data").unwrap(),
        EditorConfig::default(),
    );
    assert_eq!(preview.page(), editor.page());
    assert!(preview.render().contains("Paragraph text"));
    assert_eq!(preview.back_link(), format!("/?data={}", editor.encoded()));
}

#[test]
fn corrupt_editor_state_falls_back_to_new_page() {
    let port = MemoryPort::with_state("{\"name\": ");
    let editor = EditorSession::open(port, EditorConfig::default());
    assert_eq!(editor.page().name, "New Page");
    assert!(editor.page().is_empty());
    // The fallback replaced the corrupt state.
    assert_eq!(editor.port().load(), page_to_json(editor.page()).ok());
}

#[test]
fn back_link_without_data_opens_a_new_page() {
    let preview = PreviewSession::open(
        &LocationPort::new("/preview", "data").unwrap(),
        EditorConfig::default(),
    );
    assert_eq!(preview.page().name, "No data provided");

    let editor = EditorSession::open(
        LocationPort::new(&preview.back_link(), "data").unwrap(),
        EditorConfig::default(),
    );
    assert_eq!(editor.page().name, "New Page");
}

#[test]
fn back_link_keeps_data_the_preview_could_not_read() {
    let original = r#"{"name":"Mine","blocks":5}"#;
    let mut port = LocationPort::new("/preview", "data").unwrap();
    port.save(original);

    let preview = PreviewSession::open(&port, EditorConfig::default());
    assert_eq!(preview.page().name, "Error loading page");

    let back = LocationPort::new(&preview.back_link(), "data").unwrap();
    assert_eq!(back.load().as_deref(), Some(original));
}

#[test]
fn preview_runs_button_scripts() {
    let mut editor = EditorSession::open(MemoryPort::new(), EditorConfig::default());
    let btn = editor.add_block(BlockType::Button);
    editor
        .update_block(btn, &BlockPatch::new().on_click(Some("print('hello from ' .. 'preview')")))
        .unwrap();

    let (sink, mut rx) = console_channel();
    let mut preview = PreviewSession::open(editor.port(), EditorConfig::default());
    preview.mount(SandboxConfig {
        console: Some(sink),
        ..Default::default()
    });
    assert!(preview.click(btn));
    preview.unmount();

    let entry = rx.try_recv().unwrap();
    assert_eq!(entry.level, ConsoleLevel::Log);
    assert_eq!(entry.message, "hello from preview");
}
