//! ドキュメントの行・文字チェーン
//!
//! ドキュメントは行ノードの双方向リストで、各行は文字ノードの双方向リスト。
//! どちらのノードもドキュメントが持つ世代付きアリーナに格納される。
//! 行の先頭文字はドキュメントの先頭索引（先頭文字 -> 行）にだけ登録され、
//! 文字ノード自身は所属行を知らない。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::buffer::arena::{Arena, NodeId};
use crate::error::{buffer::Result, BufferError, IntegrityError};

/// 行末の番兵文字
pub const SENTINEL: char = '\n';

pub(crate) type CharId = NodeId;
pub(crate) type LineId = NodeId;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// ドキュメントの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 文字ノード
#[derive(Debug, Clone)]
pub(crate) struct CharNode {
    pub(crate) ch: char,
    pub(crate) prev: Option<CharId>,
    pub(crate) next: Option<CharId>,
}

impl CharNode {
    fn detached(ch: char) -> Self {
        Self {
            ch,
            prev: None,
            next: None,
        }
    }
}

/// 行ノード
#[derive(Debug, Clone)]
pub(crate) struct LineNode {
    pub(crate) head: CharId,
    pub(crate) prev: Option<LineId>,
    pub(crate) next: Option<LineId>,
}

/// 文字を指すカーソル
///
/// 新しい文字はカーソルの文字の直前に挿入される。
/// ドキュメントを所有しないハンドルで、使用のたびに検証される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    document: DocumentId,
    node: CharId,
}

impl Cursor {
    pub(crate) fn new(document: DocumentId, node: CharId) -> Self {
        Self { document, node }
    }

    /// カーソルが属するドキュメント
    pub fn document_id(&self) -> DocumentId {
        self.document
    }
}

/// 解放結果の統計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub lines_released: usize,
    pub chars_released: usize,
}

/// 編集中のドキュメント全体
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    pub(crate) chars: Arena<CharNode>,
    pub(crate) lines: Arena<LineNode>,
    pub(crate) heads: HashMap<CharId, LineId>,
    pub(crate) first_line: LineId,
}

impl Document {
    /// 番兵だけを持つ1行のドキュメントと、その番兵を指すカーソルを作成
    pub fn create_empty() -> Result<(Self, Cursor)> {
        let mut chars = Arena::new();
        let mut lines = Arena::new();
        let mut heads = HashMap::new();
        chars.reserve(1, "sentinel")?;
        lines.reserve(1, "line")?;
        heads
            .try_reserve(1)
            .map_err(|_| BufferError::AllocationFailure { what: "head index" })?;

        let sentinel = chars.insert(CharNode::detached(SENTINEL));
        let line = lines.insert(LineNode {
            head: sentinel,
            prev: None,
            next: None,
        });
        heads.insert(sentinel, line);

        let document = Self {
            id: DocumentId::next(),
            chars,
            lines,
            heads,
            first_line: line,
        };
        let cursor = Cursor::new(document.id, sentinel);
        Ok((document, cursor))
    }

    /// テキストから文書を構築し、末尾の番兵を指すカーソルを返す
    pub fn from_text(text: &str) -> Result<(Self, Cursor)> {
        let (mut document, mut cursor) = Self::create_empty()?;
        for ch in text.chars() {
            cursor = if ch == SENTINEL {
                document.pressed_enter(cursor)?
            } else {
                document.insert_char(cursor, ch)?
            };
        }
        Ok((document, cursor))
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// 先頭行の先頭文字を指すカーソル
    pub fn first_cursor(&self) -> Cursor {
        Cursor::new(self.id, self.line_node(self.first_line).head)
    }

    /// 全ノードを解放する
    ///
    /// `self` を消費するので二重解放は起こらない。
    pub fn teardown(mut self) -> TeardownReport {
        self.heads.clear();
        TeardownReport {
            lines_released: self.lines.clear(),
            chars_released: self.chars.clear(),
        }
    }

    // ---- 検証 ----

    /// カーソルがこの文書の生存中の文字を指しているか
    pub fn is_live(&self, cursor: Cursor) -> bool {
        self.validate(cursor).is_ok()
    }

    pub(crate) fn validate(&self, cursor: Cursor) -> Result<CharId> {
        if cursor.document != self.id {
            return Err(BufferError::InvalidCursor {
                reason: "cursor belongs to another document",
            });
        }
        if !self.chars.contains(cursor.node) {
            return Err(BufferError::InvalidCursor {
                reason: "cursor points at a released character",
            });
        }
        Ok(cursor.node)
    }

    pub(crate) fn cursor_at(&self, node: CharId) -> Cursor {
        Cursor::new(self.id, node)
    }

    // ---- ノードアクセス ----

    pub(crate) fn char_node(&self, id: CharId) -> &CharNode {
        self.chars
            .get(id)
            .expect("character chain points at a released node")
    }

    pub(crate) fn char_node_mut(&mut self, id: CharId) -> &mut CharNode {
        self.chars
            .get_mut(id)
            .expect("character chain points at a released node")
    }

    pub(crate) fn line_node(&self, id: LineId) -> &LineNode {
        self.lines
            .get(id)
            .expect("line chain points at a released node")
    }

    pub(crate) fn line_node_mut(&mut self, id: LineId) -> &mut LineNode {
        self.lines
            .get_mut(id)
            .expect("line chain points at a released node")
    }

    /// 番兵かどうか（番兵は常に行の最後の文字）
    pub(crate) fn is_sentinel_node(&self, id: CharId) -> bool {
        self.char_node(id).next.is_none()
    }

    /// 行の先頭文字まで戻る
    pub(crate) fn head_of(&self, id: CharId) -> CharId {
        let mut current = id;
        while let Some(prev) = self.char_node(current).prev {
            current = prev;
        }
        current
    }

    /// 行の番兵まで進む
    pub(crate) fn sentinel_of(&self, id: CharId) -> CharId {
        let mut current = id;
        while let Some(next) = self.char_node(current).next {
            current = next;
        }
        current
    }

    /// 文字が属する行
    pub(crate) fn line_of(&self, id: CharId) -> LineId {
        let head = self.head_of(id);
        *self
            .heads
            .get(&head)
            .expect("line head is missing from the head index")
    }

    /// 行の先頭を差し替え、先頭索引を同時に更新する
    pub(crate) fn set_head(&mut self, line: LineId, new_head: CharId) {
        let old_head = self.line_node(line).head;
        if old_head == new_head {
            return;
        }
        self.heads.remove(&old_head);
        self.heads.insert(new_head, line);
        self.line_node_mut(line).head = new_head;
    }

    /// 以降の操作に必要な領域を先に確保する
    ///
    /// ここで失敗した場合、文書には何も変更が加わっていない。
    pub(crate) fn reserve_nodes(&mut self, chars: usize, lines: usize) -> Result<()> {
        self.chars.reserve(chars, "character")?;
        self.lines.reserve(lines, "line")?;
        self.heads
            .try_reserve(lines + 1)
            .map_err(|_| BufferError::AllocationFailure { what: "head index" })
    }

    // ---- 文字チェーンのスプライス ----

    /// `left` と `right` を隣接させる（どちらかが無ければ鎖の端になる）
    pub(crate) fn link_chars(&mut self, left: Option<CharId>, right: Option<CharId>) {
        if let Some(left) = left {
            self.char_node_mut(left).next = right;
        }
        if let Some(right) = right {
            self.char_node_mut(right).prev = left;
        }
    }

    /// `id` の直前で鎖を切断し、切り離された左側の末尾を返す
    pub(crate) fn cut_before(&mut self, id: CharId) -> Option<CharId> {
        let left = self.char_node(id).prev;
        if let Some(left) = left {
            self.char_node_mut(left).next = None;
        }
        self.char_node_mut(id).prev = None;
        left
    }

    /// 文字を鎖から外して解放する
    pub(crate) fn unlink_char(&mut self, id: CharId) -> CharNode {
        let (prev, next) = {
            let node = self.char_node(id);
            (node.prev, node.next)
        };
        self.link_chars(prev, next);
        self.chars
            .remove(id)
            .expect("unlinked character was already released")
    }

    /// 新しい文字ノードを確保する（事前に `reserve_nodes` 済みであること）
    pub(crate) fn alloc_char(&mut self, ch: char) -> CharId {
        self.chars.insert(CharNode::detached(ch))
    }

    // ---- 行チェーン ----

    /// 先頭文字 `head` を持つ行を作成する（まだどこにもリンクされない）
    pub(crate) fn alloc_line(&mut self, head: CharId) -> LineId {
        let line = self.lines.insert(LineNode {
            head,
            prev: None,
            next: None,
        });
        self.heads.insert(head, line);
        line
    }

    /// `new_line` を `anchor` の直後に挿入する
    pub(crate) fn link_line_after(&mut self, anchor: LineId, new_line: LineId) {
        let after = self.line_node(anchor).next;
        {
            let node = self.line_node_mut(new_line);
            node.prev = Some(anchor);
            node.next = after;
        }
        self.line_node_mut(anchor).next = Some(new_line);
        if let Some(after) = after {
            self.line_node_mut(after).prev = Some(new_line);
        }
    }

    /// 行を文書から外して解放する
    ///
    /// 行が持っていた文字は解放しない。呼び出し側が別の行へ移していること。
    pub(crate) fn unlink_line(&mut self, line: LineId) -> LineNode {
        let (prev, next, head) = {
            let node = self.line_node(line);
            (node.prev, node.next, node.head)
        };
        match prev {
            Some(prev) => self.line_node_mut(prev).next = next,
            None => {
                if let Some(next) = next {
                    self.first_line = next;
                }
            }
        }
        if let Some(next) = next {
            self.line_node_mut(next).prev = prev;
        }
        if self.heads.get(&head) == Some(&line) {
            self.heads.remove(&head);
        }
        self.lines
            .remove(line)
            .expect("unlinked line was already released")
    }

    /// 文書順に行を走査
    pub(crate) fn line_ids(&self) -> LineIter<'_> {
        LineIter {
            document: self,
            next: Some(self.first_line),
        }
    }

    /// 行内の文字を先頭から番兵まで走査
    pub(crate) fn chars_from(&self, head: CharId) -> CharIter<'_> {
        CharIter {
            document: self,
            next: Some(head),
        }
    }

    // ---- 参照系 ----

    /// 行数
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 番兵を除いた文字数
    pub fn char_count(&self) -> usize {
        self.chars.len() - self.lines.len()
    }

    /// 各行のテキスト（番兵を除く）
    pub fn lines(&self) -> Vec<String> {
        self.line_ids()
            .map(|line| {
                self.chars_from(self.line_node(line).head)
                    .take_while(|(id, _)| !self.is_sentinel_node(*id))
                    .map(|(_, ch)| ch)
                    .collect::<String>()
            })
            .collect()
    }

    /// カーソル位置の文字
    pub fn char_at(&self, cursor: Cursor) -> Result<char> {
        let id = self.validate(cursor)?;
        Ok(self.char_node(id).ch)
    }

    /// カーソルが行末の番兵を指しているか
    pub fn is_sentinel(&self, cursor: Cursor) -> Result<bool> {
        let id = self.validate(cursor)?;
        Ok(self.is_sentinel_node(id))
    }

    /// カーソルの行番号（0ベース）
    pub fn line_index_of(&self, cursor: Cursor) -> Result<usize> {
        let id = self.validate(cursor)?;
        let line = self.line_of(id);
        Ok(self
            .line_ids()
            .position(|candidate| candidate == line)
            .expect("cursor line is not reachable from the first line"))
    }

    /// カーソルの列番号（0ベース、文字単位）
    pub fn column_of(&self, cursor: Cursor) -> Result<usize> {
        let id = self.validate(cursor)?;
        let mut column = 0;
        let mut current = id;
        while let Some(prev) = self.char_node(current).prev {
            column += 1;
            current = prev;
        }
        Ok(column)
    }

    /// 行・文字チェーンと先頭索引の整合性を検査する
    pub fn check_integrity(&self) -> std::result::Result<(), IntegrityError> {
        if self.line_node(self.first_line).prev.is_some() {
            return Err(IntegrityError::FirstLineHasPrevious);
        }

        let mut reachable_chars = 0;
        let mut reachable_lines = 0;
        let mut previous_line = None;
        let mut current_line = Some(self.first_line);

        while let Some(line_id) = current_line {
            let line_no = reachable_lines;
            let line = self
                .lines
                .get(line_id)
                .ok_or(IntegrityError::BrokenLineLink { line: line_no })?;
            if line.prev != previous_line {
                return Err(IntegrityError::BrokenLineLink { line: line_no });
            }
            if self.heads.get(&line.head) != Some(&line_id) {
                return Err(IntegrityError::UnregisteredHead { line: line_no });
            }

            let head = self
                .chars
                .get(line.head)
                .ok_or(IntegrityError::UnregisteredHead { line: line_no })?;
            if head.prev.is_some() {
                return Err(IntegrityError::HeadHasPrevious { line: line_no });
            }

            let mut column = 0;
            let mut previous_char = None;
            let mut current_char = Some(line.head);
            let mut last_ch = None;
            let mut sentinels = 0;
            while let Some(char_id) = current_char {
                let node = self.chars.get(char_id).ok_or(IntegrityError::BrokenCharLink {
                    line: line_no,
                    column,
                })?;
                if node.prev != previous_char {
                    return Err(IntegrityError::BrokenCharLink {
                        line: line_no,
                        column,
                    });
                }
                if node.ch == SENTINEL {
                    sentinels += 1;
                }
                last_ch = Some(node.ch);
                reachable_chars += 1;
                column += 1;
                previous_char = Some(char_id);
                current_char = node.next;
            }
            if last_ch != Some(SENTINEL) || sentinels != 1 {
                return Err(IntegrityError::BadSentinel { line: line_no });
            }

            reachable_lines += 1;
            previous_line = Some(line_id);
            current_line = line.next;
        }

        if self.heads.len() != reachable_lines {
            return Err(IntegrityError::HeadIndexSize {
                entries: self.heads.len(),
                lines: reachable_lines,
            });
        }
        if reachable_lines != self.lines.len() {
            return Err(IntegrityError::LeakedLines {
                reachable: reachable_lines,
                allocated: self.lines.len(),
            });
        }
        if reachable_chars != self.chars.len() {
            return Err(IntegrityError::LeakedCharacters {
                reachable: reachable_chars,
                allocated: self.chars.len(),
            });
        }
        Ok(())
    }
}

/// 文書順の行イテレータ
pub(crate) struct LineIter<'a> {
    document: &'a Document,
    next: Option<LineId>,
}

impl Iterator for LineIter<'_> {
    type Item = LineId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.document.line_node(current).next;
        Some(current)
    }
}

/// 行内の文字イテレータ
pub(crate) struct CharIter<'a> {
    document: &'a Document,
    next: Option<CharId>,
}

impl Iterator for CharIter<'_> {
    type Item = (CharId, char);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let node = self.document.char_node(current);
        self.next = node.next;
        Some((current, node.ch))
    }
}
