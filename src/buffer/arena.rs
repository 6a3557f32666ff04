//! 世代付きアリーナ
//!
//! 行・文字ノードを安定したインデックスで保持する。解放済みスロットは
//! 世代番号を進めてから再利用するため、古いハンドルは必ず検出できる。

use crate::error::BufferError;

/// アリーナ内のスロットを指すハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// スロット番号
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// 世代付きアリーナ本体
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
    limit: Option<usize>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            limit: None,
        }
    }

    /// 生存ノード数の上限を設定（確保失敗の再現用）
    #[cfg(test)]
    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    /// 生存中のノード数
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 続く `additional` 回の `insert` が再確保なしで成功するよう領域を確保する
    ///
    /// 失敗時はアリーナに一切変更を加えない。
    pub fn reserve(&mut self, additional: usize, what: &'static str) -> Result<(), BufferError> {
        if matches!(self.limit, Some(limit) if self.len + additional > limit) {
            return Err(BufferError::AllocationFailure { what });
        }
        let reusable = self.free_slot_count(additional);
        let needed = additional - reusable;
        if needed == 0 {
            return Ok(());
        }
        self.slots
            .try_reserve(needed)
            .map_err(|_| BufferError::AllocationFailure { what })?;
        if self.slots.len() + needed > u32::MAX as usize {
            return Err(BufferError::AllocationFailure { what });
        }
        Ok(())
    }

    fn free_slot_count(&self, limit: usize) -> usize {
        let mut count = 0;
        let mut cursor = self.free_head;
        while let (Some(index), true) = (cursor, count < limit) {
            count += 1;
            cursor = match self.slots[index as usize] {
                Slot::Vacant { next_free, .. } => next_free,
                Slot::Occupied { .. } => None,
            };
        }
        count
    }

    /// 値を格納してハンドルを返す
    ///
    /// 事前に `reserve` していればこの呼び出しは再確保を行わない。
    pub fn insert(&mut self, value: T) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let (generation, next_free) = match *slot {
                Slot::Vacant { generation, next_free } => (generation, next_free),
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            *slot = Slot::Occupied { generation, value };
            self.free_head = next_free;
            return NodeId { index, generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied { generation: 0, value });
        NodeId { index, generation: 0 }
    }

    /// 値を取り除き、スロットの世代を進める
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {}
            _ => return None,
        }

        let next = Slot::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let previous = std::mem::replace(slot, next);
        self.free_head = Some(id.index);
        self.len -= 1;
        match previous {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index())? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index())? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// 全ノードを解放し、解放した数を返す
    pub fn clear(&mut self) -> usize {
        let released = self.len;
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
        released
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
