//! 入力処理モジュール
//!
//! 1行1コマンドの入力をコマンドへ変換する

pub mod commands;

// 公開API
pub use commands::Command;
