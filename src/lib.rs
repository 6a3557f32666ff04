//! linebuf - 行・文字チェーンによるカーソル駆動テキストバッファ
//!
//! モジュール構成
//!
//! - `buffer`: 文書データ構造と編集・移動・表示操作（コア）
//! - `input`: 1行1コマンドの入力解釈
//! - `session`: コマンドを文書へ適用するディスパッチループ

// コアモジュール
pub mod error;
pub mod logging;
pub mod options;

// データ層
pub mod buffer;

// ロジック層
pub mod input;
pub mod session;

// 公開API
pub use buffer::{Cursor, Document};
pub use error::{BufferError, LinebufError, Result};
pub use input::Command;
pub use options::SessionOptions;
pub use session::{Flow, Session, SessionReport};
