//! 編集操作
//!
//! 挿入・改行・削除。いずれもカーソル検証と領域確保を構造変更より先に済ませ、
//! 失敗時には文書を一切変更しない。

use crate::buffer::document::{CharId, Cursor, Document, LineId, SENTINEL};
use crate::error::{buffer::Result, BufferError};

impl Document {
    /// カーソルの直前に文字を挿入する
    ///
    /// 返すカーソルは引数と同じ文字を指す。続けて挿入すると
    /// 同じ位置の手前に文字が並んでいく。
    pub fn insert_char(&mut self, cursor: Cursor, ch: char) -> Result<Cursor> {
        let target = self.validate(cursor)?;
        if ch == SENTINEL {
            return Err(BufferError::InvalidCharacter(ch));
        }
        self.reserve_nodes(1, 0)?;

        let prev = self.char_node(target).prev;
        // 繋ぎ替えると `target` から行を引けなくなるので先に求める
        let head_line = prev.is_none().then(|| self.line_of(target));
        let inserted = self.alloc_char(ch);
        self.link_chars(prev, Some(inserted));
        self.link_chars(Some(inserted), Some(target));

        if let Some(line) = head_line {
            self.set_head(line, inserted);
        }

        debug_assert!(self.check_integrity().is_ok());
        Ok(cursor)
    }

    /// カーソル位置で行を分割する
    ///
    /// 番兵上なら直後に空行を作りその番兵へ、そうでなければカーソル以降を
    /// 新しい行へ移し、カーソルはその行頭になる。
    pub fn pressed_enter(&mut self, cursor: Cursor) -> Result<Cursor> {
        let target = self.validate(cursor)?;
        self.reserve_nodes(1, 1)?;
        let line = self.line_of(target);

        if self.is_sentinel_node(target) {
            let sentinel = self.alloc_char(SENTINEL);
            let new_line = self.alloc_line(sentinel);
            self.link_line_after(line, new_line);

            debug_assert!(self.check_integrity().is_ok());
            return Ok(self.cursor_at(sentinel));
        }

        // 残る側を新しい番兵で閉じる
        let retained_tail = self.cut_before(target);
        let sentinel = self.alloc_char(SENTINEL);
        match retained_tail {
            Some(tail) => self.link_chars(Some(tail), Some(sentinel)),
            None => self.set_head(line, sentinel),
        }

        let new_line = self.alloc_line(target);
        self.link_line_after(line, new_line);

        debug_assert!(self.check_integrity().is_ok());
        Ok(cursor)
    }

    /// カーソル位置の文字を削除する
    ///
    /// 番兵上では次の行を連結する。最終行の番兵では何もしない。
    pub fn pressed_delete(&mut self, cursor: Cursor) -> Result<Cursor> {
        let target = self.validate(cursor)?;

        if self.is_sentinel_node(target) {
            let line = self.line_of(target);
            let Some(next_line) = self.line_node(line).next else {
                return Ok(cursor);
            };
            self.reserve_nodes(0, 0)?;
            return Ok(self.join_lines(line, next_line, target));
        }

        self.reserve_nodes(0, 0)?;
        let next = self
            .char_node(target)
            .next
            .expect("non-sentinel character has a successor");
        if self.char_node(target).prev.is_none() {
            let line = self.line_of(target);
            self.set_head(line, next);
        }
        self.unlink_char(target);

        debug_assert!(self.check_integrity().is_ok());
        Ok(self.cursor_at(next))
    }

    /// `line` の番兵を捨てて `next_line` の文字列を末尾へ繋ぐ
    fn join_lines(&mut self, line: LineId, next_line: LineId, sentinel: CharId) -> Cursor {
        let joined = self.line_node(next_line).head;
        let was_empty = self.char_node(sentinel).prev.is_none();

        self.unlink_line(next_line);
        if was_empty {
            self.set_head(line, joined);
        }
        let removed = self.unlink_char(sentinel);
        debug_assert_eq!(removed.ch, SENTINEL);
        // 番兵の直前（あれば）と次行の先頭を繋ぐ
        let before = removed.prev;
        self.link_chars(before, Some(joined));

        debug_assert!(self.check_integrity().is_ok());
        self.cursor_at(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(text: &str) -> (Document, Cursor) {
        Document::from_text(text).unwrap()
    }

    #[test]
    fn test_insert_into_empty_document() {
        let (mut document, cursor) = Document::create_empty().unwrap();
        let cursor = document.insert_char(cursor, 'a').unwrap();
        let cursor = document.insert_char(cursor, 'b').unwrap();
        let cursor = document.insert_char(cursor, 'c').unwrap();

        assert_eq!(document.render_line(cursor).unwrap(), "abc\n");
        assert_eq!(document.is_sentinel(cursor), Ok(true));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_insert_before_head_moves_head() {
        let (mut document, cursor) = build("bc");
        let head = document.home(cursor).unwrap();
        let after = document.insert_char(head, 'a').unwrap();

        assert_eq!(after, head);
        assert_eq!(document.lines(), vec!["abc"]);
        assert_eq!(document.column_of(after), Ok(1));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_insert_newline_character_is_rejected() {
        let (mut document, cursor) = build("ab");
        assert_eq!(
            document.insert_char(cursor, '\n'),
            Err(BufferError::InvalidCharacter('\n'))
        );
        assert_eq!(document.lines(), vec!["ab"]);
    }

    #[test]
    fn test_enter_at_sentinel_creates_empty_line() {
        let (mut document, cursor) = build("abc");
        let cursor = document.pressed_enter(cursor).unwrap();

        assert_eq!(document.lines(), vec!["abc", ""]);
        assert_eq!(document.line_index_of(cursor), Ok(1));
        assert_eq!(document.is_sentinel(cursor), Ok(true));
    }

    #[test]
    fn test_enter_in_middle_splits_line() {
        let (mut document, cursor) = build("abc");
        let at_c = document.left(cursor).unwrap();
        let cursor = document.pressed_enter(at_c).unwrap();

        assert_eq!(cursor, at_c);
        assert_eq!(document.lines(), vec!["ab", "c"]);
        assert_eq!(document.render_document(), "ab\nc\n");
        assert_eq!(document.line_index_of(cursor), Ok(1));
        assert_eq!(document.column_of(cursor), Ok(0));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_enter_at_head_leaves_empty_line_above() {
        let (mut document, cursor) = build("abc");
        let head = document.home(cursor).unwrap();
        let cursor = document.pressed_enter(head).unwrap();

        assert_eq!(document.lines(), vec!["", "abc"]);
        assert_eq!(document.line_index_of(cursor), Ok(1));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_delete_sentinel_merges_lines() {
        let (mut document, cursor) = build("ab\nc");
        let first_end = document.up(cursor).and_then(|c| document.end(c)).unwrap();
        let cursor = document.pressed_delete(first_end).unwrap();

        assert_eq!(document.lines(), vec!["abc"]);
        assert_eq!(document.char_at(cursor), Ok('c'));
        assert_eq!(document.column_of(cursor), Ok(2));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_delete_sentinel_of_empty_line_adopts_next_head() {
        let (mut document, cursor) = build("\nxy");
        let empty = document.up(cursor).unwrap();
        let cursor = document.pressed_delete(empty).unwrap();

        assert_eq!(document.lines(), vec!["xy"]);
        assert_eq!(document.char_at(cursor), Ok('x'));
        assert_eq!(document.home(cursor), Ok(cursor));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_delete_joining_empty_next_line_returns_its_sentinel() {
        let (mut document, cursor) = build("ab\n");
        let first_end = document.up(cursor).and_then(|c| document.end(c)).unwrap();
        let cursor = document.pressed_delete(first_end).unwrap();

        assert_eq!(document.lines(), vec!["ab"]);
        assert_eq!(document.is_sentinel(cursor), Ok(true));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_delete_at_last_sentinel_is_noop() {
        let (mut document, cursor) = build("abc");
        let before = document.lines();
        let after = document.pressed_delete(cursor).unwrap();

        assert_eq!(after, cursor);
        assert_eq!(document.lines(), before);
        assert_eq!(document.char_count(), 3);
    }

    #[test]
    fn test_delete_ordinary_character() {
        let (mut document, cursor) = build("abc");
        let at_b = document.left(cursor).and_then(|c| document.left(c)).unwrap();
        let cursor = document.pressed_delete(at_b).unwrap();

        assert_eq!(document.lines(), vec!["ac"]);
        assert_eq!(document.char_at(cursor), Ok('c'));
        assert!(!document.is_live(at_b));
    }

    #[test]
    fn test_delete_head_transfers_head() {
        let (mut document, cursor) = build("abc");
        let head = document.home(cursor).unwrap();
        let cursor = document.pressed_delete(head).unwrap();

        assert_eq!(document.lines(), vec!["bc"]);
        assert_eq!(document.home(cursor), Ok(cursor));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_stale_cursor_fails_loudly() {
        let (mut document, cursor) = build("ab");
        let at_b = document.left(cursor).unwrap();
        document.pressed_delete(at_b).unwrap();

        assert_eq!(
            document.insert_char(at_b, 'x'),
            Err(BufferError::InvalidCursor {
                reason: "cursor points at a released character"
            })
        );
        assert_eq!(document.lines(), vec!["a"]);
    }

    #[test]
    fn test_insert_at_head_of_later_line() {
        let (mut document, cursor) = build("ab
cd");
        let head = document.home(cursor).unwrap();
        let after = document.insert_char(head, 'x').unwrap();

        assert_eq!(document.lines(), vec!["ab", "xcd"]);
        assert_eq!(document.line_index_of(after), Ok(1));
        assert_eq!(document.column_of(after), Ok(1));
        assert!(document.check_integrity().is_ok());
    }

    #[test]
    fn test_allocation_failure_leaves_document_untouched() {
        let (mut document, cursor) = build("ab
cd");
        let head = document.home(cursor).unwrap();
        let before = document.lines();
        document.chars.set_limit(document.chars.len());

        for result in [
            document.insert_char(head, 'x'),
            document.insert_char(cursor, 'x'),
            document.pressed_enter(head),
            document.pressed_enter(cursor),
        ] {
            assert_eq!(
                result,
                Err(BufferError::AllocationFailure { what: "character" })
            );
        }
        assert_eq!(document.lines(), before);
        assert_eq!(document.render_document(), "ab\ncd\n");
        assert!(document.check_integrity().is_ok());

        // 削除は新しいノードを必要としない
        let cursor = document.pressed_delete(head).unwrap();
        assert_eq!(document.lines(), vec!["ab", "d"]);
        assert!(document.is_live(cursor));
    }

    #[test]
    fn test_line_allocation_failure_on_enter() {
        let (mut document, cursor) = build("abc");
        let at_c = document.left(cursor).unwrap();
        document.lines.set_limit(document.line_count());

        assert_eq!(
            document.pressed_enter(at_c),
            Err(BufferError::AllocationFailure { what: "line" })
        );
        assert_eq!(document.lines(), vec!["abc"]);
        assert_eq!(document.char_count(), 3);
        assert!(document.check_integrity().is_ok());
    }
}
