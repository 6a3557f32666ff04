//! ナビゲーションシステム
//!
//! 行・文字チェーン上のカーソル移動。構造は一切変更しない。
//! 文書の端での移動はエラーではなく、同じカーソルを返す。

use crate::buffer::document::{Cursor, Document};
use crate::error::buffer::Result;

/// ナビゲーション操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
    MoveCharForward,
    MoveCharBackward,
    MoveLineUp,
    MoveLineDown,
    MoveLineStart,
    MoveLineEnd,
}

impl Document {
    /// 操作種別に応じてカーソルを移動
    pub fn navigate(&self, cursor: Cursor, action: NavigationAction) -> Result<Cursor> {
        match action {
            NavigationAction::MoveCharForward => self.right(cursor),
            NavigationAction::MoveCharBackward => self.left(cursor),
            NavigationAction::MoveLineUp => self.up(cursor),
            NavigationAction::MoveLineDown => self.down(cursor),
            NavigationAction::MoveLineStart => self.home(cursor),
            NavigationAction::MoveLineEnd => self.end(cursor),
        }
    }

    /// 行頭へ移動
    pub fn home(&self, cursor: Cursor) -> Result<Cursor> {
        let id = self.validate(cursor)?;
        Ok(self.cursor_at(self.head_of(id)))
    }

    /// 行末（番兵）へ移動
    pub fn end(&self, cursor: Cursor) -> Result<Cursor> {
        let id = self.validate(cursor)?;
        Ok(self.cursor_at(self.sentinel_of(id)))
    }

    /// 1文字左へ。行頭なら前の行の番兵へ
    pub fn left(&self, cursor: Cursor) -> Result<Cursor> {
        let id = self.validate(cursor)?;
        if let Some(prev) = self.char_node(id).prev {
            return Ok(self.cursor_at(prev));
        }

        let line = self.line_of(id);
        match self.line_node(line).prev {
            Some(prev_line) => {
                let head = self.line_node(prev_line).head;
                Ok(self.cursor_at(self.sentinel_of(head)))
            }
            None => Ok(cursor),
        }
    }

    /// 1文字右へ。番兵なら次の行の行頭へ
    pub fn right(&self, cursor: Cursor) -> Result<Cursor> {
        let id = self.validate(cursor)?;
        if let Some(next) = self.char_node(id).next {
            return Ok(self.cursor_at(next));
        }

        let line = self.line_of(id);
        match self.line_node(line).next {
            Some(next_line) => Ok(self.cursor_at(self.line_node(next_line).head)),
            None => Ok(cursor),
        }
    }

    /// 前の行の行頭へ（列は保持しない）
    pub fn up(&self, cursor: Cursor) -> Result<Cursor> {
        let id = self.validate(cursor)?;
        let line = self.line_of(id);
        match self.line_node(line).prev {
            Some(prev_line) => Ok(self.cursor_at(self.line_node(prev_line).head)),
            None => Ok(cursor),
        }
    }

    /// 次の行の行頭へ
    pub fn down(&self, cursor: Cursor) -> Result<Cursor> {
        let id = self.validate(cursor)?;
        let line = self.line_of(id);
        match self.line_node(line).next {
            Some(next_line) => Ok(self.cursor_at(self.line_node(next_line).head)),
            None => Ok(cursor),
        }
    }
}
