pub mod config;
pub mod editor;
pub mod port;
pub mod preview;

pub use config::EditorConfig;
pub use editor::EditorSession;
pub use port::{LocationPort, MemoryPort, PersistencePort};
pub use preview::PreviewSession;
