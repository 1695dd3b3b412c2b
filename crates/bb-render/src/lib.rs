pub mod html;
pub mod mounts;

pub use html::{escape_html, render_html, style_attr};
pub use mounts::ScriptMounts;
