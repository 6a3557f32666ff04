//! バッファ管理モジュール
//!
//! 行・文字の連結チェーンで構成される文書と、その上の編集・移動・表示操作を提供

pub mod arena;
pub mod document;
pub mod editing;
pub mod navigation;
pub mod render;

// 公開API
pub use arena::{Arena, NodeId};
pub use document::{Cursor, Document, DocumentId, TeardownReport, SENTINEL};
pub use navigation::NavigationAction;
pub use crate::error::{BufferError, IntegrityError};
