//! 表示用テキスト生成
//!
//! 行・文書全体を文字列化する。出力先への書き込みは呼び出し側が行う。

use std::io::{self, Write};

use crate::buffer::document::{CharId, Cursor, Document, LineId, SENTINEL};
use crate::error::buffer::Result;

impl Document {
    /// カーソルのある行を改行付きで返す。空行は `"\n"`
    pub fn render_line(&self, cursor: Cursor) -> Result<String> {
        let id = self.validate(cursor)?;
        let mut out = String::new();
        self.push_line(self.head_of(id), &mut out);
        Ok(out)
    }

    /// 文書全体を返す
    pub fn render_document(&self) -> String {
        let mut out = String::new();
        for line in self.line_ids() {
            self.push_line(self.line_head(line), &mut out);
        }
        out
    }

    /// カーソルのある行を書き出す
    pub fn write_line<W: Write>(&self, cursor: Cursor, out: &mut W) -> crate::error::Result<()> {
        let line = self.render_line(cursor)?;
        out.write_all(line.as_bytes())?;
        Ok(())
    }

    /// 文書全体を1行ずつ書き出す
    pub fn write_document<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut line_buf = String::new();
        for line in self.line_ids() {
            line_buf.clear();
            self.push_line(self.line_head(line), &mut line_buf);
            out.write_all(line_buf.as_bytes())?;
        }
        Ok(())
    }

    fn line_head(&self, line: LineId) -> CharId {
        self.line_node(line).head
    }

    fn push_line(&self, head: CharId, out: &mut String) {
        out.extend(
            self.chars_from(head)
                .take_while(|(id, _)| !self.is_sentinel_node(*id))
                .map(|(_, ch)| ch),
        );
        out.push(SENTINEL);
    }
}
