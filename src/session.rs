//! 編集セッション
//!
//! 文書と現在のカーソルを保持し、コマンドを1つずつ適用する。
//! 入出力はここに閉じ込め、バッファ層は入出力を知らない。

use std::io::{BufRead, Write};

use serde::Serialize;

use crate::buffer::{Cursor, Document, TeardownReport};
use crate::error::{ErrorContext, LinebufError, Result};
use crate::input::Command;
use crate::log_debug_here;
use crate::logging::Logger;
use crate::options::SessionOptions;

/// コマンド適用後の制御
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// セッション終了時の統計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// 適用したコマンド数（空行・無視したオペコードを除く）
    pub commands_executed: usize,
    /// そのうち文書を変更したコマンド数
    pub edits_applied: usize,
    /// 無視した未知オペコードの数
    pub commands_skipped: usize,
    /// 解放した行・文字
    pub released: TeardownReport,
}

/// 1つの文書に対する編集セッション
pub struct Session {
    document: Document,
    cursor: Cursor,
    logger: Logger,
    strict: bool,
    commands_executed: usize,
    edits_applied: usize,
    commands_skipped: usize,
}

impl Session {
    /// 空の文書でセッションを開始
    pub fn new(options: &SessionOptions) -> Result<Self> {
        let logger = options.build_logger()?;
        Self::with_logger(logger, options.is_strict())
    }

    /// ロガーを指定してセッションを開始
    pub fn with_logger(logger: Logger, strict: bool) -> Result<Self> {
        let (document, cursor) = Document::create_empty().with_context_info(&logger, "session start")?;
        Ok(Self {
            document,
            cursor,
            logger,
            strict,
            commands_executed: 0,
            edits_applied: 0,
            commands_skipped: 0,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// コマンドを1つ適用する
    ///
    /// 表示コマンドは `out` に書き出す。`Quit` は文書に触れない。
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        log::debug!("execute {:?} ({})", command, command.description());
        let cursor = self.cursor;
        let document = &mut self.document;

        let next = match command {
            Command::InsertChar(ch) => document.insert_char(cursor, ch),
            Command::Enter => document.pressed_enter(cursor),
            Command::Delete => document.pressed_delete(cursor),
            Command::PrintLine => {
                document.write_line(cursor, out)?;
                Ok(cursor)
            }
            Command::PrintText => {
                document.write_document(out)?;
                Ok(cursor)
            }
            Command::Quit => return Ok(Flow::Quit),
            movement => match movement.navigation() {
                Some(action) => document.navigate(cursor, action),
                None => Ok(cursor),
            },
        };

        self.cursor = next.with_context_info(&self.logger, "execute")?;
        self.commands_executed += 1;
        if command.is_edit() {
            self.edits_applied += 1;
        }
        Ok(Flow::Continue)
    }

    /// 入力1行を解釈して適用する
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        match Command::decode(line) {
            Ok(Some(command)) => self.execute(command, out),
            Ok(None) => Ok(Flow::Continue),
            Err(error) if !self.strict => {
                self.logger
                    .log_warning(format!("ignoring input line {line:?}: {error}"), Some("decode"));
                self.commands_skipped += 1;
                Ok(Flow::Continue)
            }
            Err(error) => Err(error).with_context_info(&self.logger, "decode"),
        }
    }

    /// `Q` か入力終端までコマンドを読み続け、最後に文書を解放する
    pub fn run<R: BufRead, W: Write>(mut self, input: R, out: &mut W) -> Result<SessionReport> {
        for line in input.lines() {
            let line = line.map_err(LinebufError::from)?;
            if self.execute_line(&line, out)? == Flow::Quit {
                log_debug_here!(self.logger, "quit requested");
                break;
            }
        }
        out.flush()?;
        Ok(self.finish())
    }

    /// 文書を解放し統計を返す
    pub fn finish(self) -> SessionReport {
        let report = SessionReport {
            commands_executed: self.commands_executed,
            edits_applied: self.edits_applied,
            commands_skipped: self.commands_skipped,
            released: self.document.teardown(),
        };
        match serde_json::to_string(&report) {
            Ok(json) => self.logger.log_info(json, Some("session finish")),
            Err(error) => self
                .logger
                .log_warning(format!("report serialization failed: {error}"), None),
        }
        report
    }
}
