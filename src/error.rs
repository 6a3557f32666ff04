//! エラーハンドリングシステム
//!
//! linebuf 全体で使用される統一されたエラー型とユーティリティを定義
//! コア（バッファ）は失敗を返すだけで、ログ出力はセッション層が担当する

use crate::logging::Logger;
use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinebufError {
    /// バッファ操作エラー
    #[error("Buffer operation failed: {0}")]
    Buffer(#[from] BufferError),

    /// コマンド解釈エラー
    #[error("Command decoding failed: {0}")]
    Command(#[from] CommandError),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 入出力エラー
    #[error("IO error: {message}")]
    Io { message: String },
}

/// バッファ操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// ノード用メモリを確保できなかった（ドキュメントは変更されない）
    #[error("Memory allocation failed for {what}")]
    AllocationFailure { what: &'static str },

    /// 現在のドキュメントに属さない、または解放済みのカーソル
    #[error("Invalid cursor: {reason}")]
    InvalidCursor { reason: &'static str },

    /// 行内に直接挿入できない文字
    #[error("Invalid character: {0:?}")]
    InvalidCharacter(char),
}

/// コマンド解釈固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown opcode: {opcode:?}")]
    UnknownOpcode { opcode: char },
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing value for option: {key}")]
    MissingValue { key: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown option: {arg}")]
    UnknownOption { arg: String },
}

/// 構造検査で見つかった不整合
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("first line has a previous line")]
    FirstLineHasPrevious,

    #[error("line {line} is not linked back to its predecessor")]
    BrokenLineLink { line: usize },

    #[error("line {line} head is not registered in the head index")]
    UnregisteredHead { line: usize },

    #[error("line {line} head has a previous character")]
    HeadHasPrevious { line: usize },

    #[error("line {line} has a broken character link at column {column}")]
    BrokenCharLink { line: usize, column: usize },

    #[error("line {line} does not end with a single sentinel")]
    BadSentinel { line: usize },

    #[error("head index holds {entries} entries for {lines} lines")]
    HeadIndexSize { entries: usize, lines: usize },

    #[error("{reachable} characters reachable but {allocated} allocated")]
    LeakedCharacters { reachable: usize, allocated: usize },

    #[error("{reachable} lines reachable but {allocated} allocated")]
    LeakedLines { reachable: usize, allocated: usize },
}

/// エラーコンテキスト付与のためのトレイト
pub trait ErrorContext<T> {
    fn with_context_info(self, logger: &Logger, operation: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<LinebufError>,
{
    fn with_context_info(self, logger: &Logger, operation: &str) -> Result<T> {
        self.map_err(|e| {
            let error = e.into();
            logger.log_error_message(format!("{error}"), Some(operation));
            error
        })
    }
}

/// パニックハンドラの設定
pub fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s
        } else {
            "Unknown panic payload"
        };

        eprintln!("PANIC at {}: {}", location, message);
        eprintln!("Stack trace: {}", std::backtrace::Backtrace::capture());
        std::process::exit(1);
    }));
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, LinebufError>;

/// 各モジュール固有のResult型
pub mod buffer {
    pub type Result<T> = std::result::Result<T, super::BufferError>;
}

// std::io::Error から LinebufError への変換
impl From<std::io::Error> for LinebufError {
    fn from(error: std::io::Error) -> Self {
        LinebufError::Io {
            message: error.to_string(),
        }
    }
}
