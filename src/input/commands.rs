//! コマンドシステム
//!
//! オペコード1文字（と任意の引数1文字）で表される編集コマンドの定義と解釈

use crate::buffer::NavigationAction;
use crate::error::CommandError;

/// `I` に引数が無いときに挿入される文字
pub const DEFAULT_INSERT_ARG: char = ' ';

/// コマンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // 編集操作
    InsertChar(char),
    Enter,
    Delete,

    // カーソル移動
    Left,
    Down,
    Up,
    Right,
    Home,
    End,

    // 表示
    PrintLine,
    PrintText,

    // アプリケーション制御
    Quit,
}

impl Command {
    /// 入力1行をコマンドへ変換
    ///
    /// 先頭の空白は読み飛ばす。`I` の引数はオペコードの2文字後
    /// （`"I a"` の `a`）で、無ければ空白になる。区切りの無い `"Ia"` も
    /// 引数なしとして扱う。空行は `Ok(None)`。
    pub fn decode(line: &str) -> Result<Option<Self>, CommandError> {
        let mut chars = line.trim_start().chars();
        let Some(opcode) = chars.next() else {
            return Ok(None);
        };

        let command = match opcode {
            'I' => Command::InsertChar(chars.nth(1).unwrap_or(DEFAULT_INSERT_ARG)),
            'N' => Command::Enter,
            'D' => Command::Delete,
            'h' => Command::Left,
            'j' => Command::Down,
            'k' => Command::Up,
            'l' => Command::Right,
            'H' => Command::Home,
            'E' => Command::End,
            'P' => Command::PrintLine,
            'T' => Command::PrintText,
            'Q' => Command::Quit,
            other => return Err(CommandError::UnknownOpcode { opcode: other }),
        };
        Ok(Some(command))
    }

    /// オペコード文字
    pub fn opcode(&self) -> char {
        match self {
            Command::InsertChar(_) => 'I',
            Command::Enter => 'N',
            Command::Delete => 'D',
            Command::Left => 'h',
            Command::Down => 'j',
            Command::Up => 'k',
            Command::Right => 'l',
            Command::Home => 'H',
            Command::End => 'E',
            Command::PrintLine => 'P',
            Command::PrintText => 'T',
            Command::Quit => 'Q',
        }
    }

    /// 移動コマンドならナビゲーション操作へ変換
    pub fn navigation(&self) -> Option<NavigationAction> {
        match self {
            Command::Left => Some(NavigationAction::MoveCharBackward),
            Command::Right => Some(NavigationAction::MoveCharForward),
            Command::Up => Some(NavigationAction::MoveLineUp),
            Command::Down => Some(NavigationAction::MoveLineDown),
            Command::Home => Some(NavigationAction::MoveLineStart),
            Command::End => Some(NavigationAction::MoveLineEnd),
            _ => None,
        }
    }

    /// 文書を変更するコマンドか
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Command::InsertChar(_) | Command::Enter | Command::Delete
        )
    }

    /// コマンドの説明を取得
    pub fn description(&self) -> &'static str {
        match self {
            Command::InsertChar(_) => "カーソルの前に文字を挿入",
            Command::Enter => "カーソル位置で行を分割",
            Command::Delete => "カーソル位置の文字を削除",
            Command::Left => "カーソルを左に移動",
            Command::Down => "次の行の先頭に移動",
            Command::Up => "前の行の先頭に移動",
            Command::Right => "カーソルを右に移動",
            Command::Home => "行頭に移動",
            Command::End => "行末に移動",
            Command::PrintLine => "現在の行を表示",
            Command::PrintText => "文書全体を表示",
            Command::Quit => "終了",
        }
    }
}
