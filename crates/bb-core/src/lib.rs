pub mod codec;
pub mod hierarchy;
pub mod id;
pub mod lint;
pub mod model;
pub mod ops;
pub mod percent;

pub use codec::{DecodeError, decode_page, decode_page_or, encode_page};
pub use hierarchy::{BlockWithChildren, Hierarchy, HierarchyNode, build_hierarchy};
pub use id::BlockId;
pub use lint::{LintDiagnostic, LintSeverity, lint_page};
pub use model::*;
pub use ops::{BlockPatch, ValidationError, new_block, update_block};
