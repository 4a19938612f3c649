use radim_core::document::{Document, Entity, EntityId};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    #[error("an undo cycle is already open")]
    CycleAlreadyOpen,
    #[error("no undo cycle is open")]
    NoOpenCycle,
}

/// 一次撤销周期内新增的实体。
#[derive(Debug, Clone, Default)]
struct UndoCycle {
    added: Vec<EntityId>,
}

/// 已撤销、等待重做的周期，保存被移除的实体数据。
#[derive(Debug, Clone)]
struct RedoCycle {
    removed: Vec<(EntityId, Entity)>,
}

/// 撤销/重做栈。新增实体通过 `begin_cycle` / `record_add` / `end_cycle`
/// 组合成单个撤销步骤。
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo: Vec<UndoCycle>,
    redo: Vec<RedoCycle>,
    open: Option<UndoCycle>,
    max_depth: usize,
}

impl UndoStack {
    pub const DEFAULT_DEPTH: usize = 100;

    pub fn new_with_capacity(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            open: None,
            max_depth: max_depth.max(1),
        }
    }

    pub fn begin_cycle(&mut self) -> Result<(), UndoError> {
        if self.open.is_some() {
            return Err(UndoError::CycleAlreadyOpen);
        }
        self.open = Some(UndoCycle::default());
        Ok(())
    }

    pub fn record_add(&mut self, id: EntityId) -> Result<(), UndoError> {
        let cycle = self.open.as_mut().ok_or(UndoError::NoOpenCycle)?;
        cycle.added.push(id);
        Ok(())
    }

    /// 关闭当前周期。空周期直接丢弃，非空周期入栈并清空重做栈。
    pub fn end_cycle(&mut self) -> Result<(), UndoError> {
        let cycle = self.open.take().ok_or(UndoError::NoOpenCycle)?;
        if cycle.added.is_empty() {
            return Ok(());
        }
        if self.undo.len() >= self.max_depth {
            self.undo.remove(0);
        }
        debug!(entities = cycle.added.len(), "撤销周期已关闭");
        self.undo.push(cycle);
        self.redo.clear();
        Ok(())
    }

    /// 丢弃打开的周期，返回是否确有周期被丢弃。
    pub fn abort_cycle(&mut self) -> bool {
        let aborted = self.open.take();
        if let Some(cycle) = &aborted {
            debug!(entities = cycle.added.len(), "撤销周期已丢弃");
        }
        aborted.is_some()
    }

    #[inline]
    pub fn is_cycle_open(&self) -> bool {
        self.open.is_some()
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[inline]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// 撤销最近一个周期，返回从文档移除的实体数量。
    pub fn undo(&mut self, document: &mut Document) -> Option<usize> {
        let cycle = self.undo.pop()?;
        let removed: Vec<(EntityId, Entity)> = cycle
            .added
            .iter()
            .rev()
            .filter_map(|id| document.remove_entity(*id).map(|entity| (*id, entity)))
            .collect();
        let count = removed.len();
        self.redo.push(RedoCycle { removed });
        Some(count)
    }

    /// 重做最近一次撤销，实体以原 ID 恢复。
    pub fn redo(&mut self, document: &mut Document) -> Option<usize> {
        let cycle = self.redo.pop()?;
        let mut added = Vec::with_capacity(cycle.removed.len());
        for (id, entity) in cycle.removed.into_iter().rev() {
            if document.restore_entity(id, entity) {
                added.push(id);
            }
        }
        let count = added.len();
        self.undo.push(UndoCycle { added });
        Some(count)
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new_with_capacity(Self::DEFAULT_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use radim_core::geometry::Point2;

    use super::*;

    #[test]
    fn cycle_brackets_are_enforced() {
        let mut stack = UndoStack::default();
        assert_eq!(stack.record_add(EntityId::new(1)), Err(UndoError::NoOpenCycle));
        assert_eq!(stack.end_cycle(), Err(UndoError::NoOpenCycle));

        stack.begin_cycle().expect("open cycle");
        assert!(stack.is_cycle_open());
        assert_eq!(stack.begin_cycle(), Err(UndoError::CycleAlreadyOpen));
        stack.end_cycle().expect("close cycle");

        // 空周期不产生撤销步骤
        assert!(!stack.can_undo());
    }

    #[test]
    fn aborted_cycle_leaves_no_undo_step() {
        let mut stack = UndoStack::default();
        assert!(!stack.abort_cycle());

        stack.begin_cycle().unwrap();
        stack.record_add(EntityId::new(3)).unwrap();
        assert!(stack.abort_cycle());

        assert!(!stack.is_cycle_open());
        assert!(!stack.can_undo());
        stack.begin_cycle().expect("ledger usable after abort");
    }

    #[test]
    fn undo_and_redo_round_trip_document_state() {
        let mut document = Document::new();
        let mut stack = UndoStack::default();

        let circle = document.add_circle(Point2::new(0.0, 0.0), 2.0, "0");
        stack.begin_cycle().unwrap();
        stack.record_add(circle).unwrap();
        stack.end_cycle().unwrap();
        assert_eq!(stack.undo_depth(), 1);

        assert_eq!(stack.undo(&mut document), Some(1));
        assert!(document.entity(circle).is_none());
        assert!(stack.can_redo());
        assert_eq!(stack.undo(&mut document), None);

        assert_eq!(stack.redo(&mut document), Some(1));
        assert!(document.entity(circle).is_some());
        assert!(!stack.can_redo());
        assert!(stack.can_undo());
    }

    #[test]
    fn new_cycle_discards_redo_history() {
        let mut document = Document::new();
        let mut stack = UndoStack::default();

        let first = document.add_circle(Point2::new(0.0, 0.0), 1.0, "0");
        stack.begin_cycle().unwrap();
        stack.record_add(first).unwrap();
        stack.end_cycle().unwrap();
        stack.undo(&mut document);
        assert!(stack.can_redo());

        let second = document.add_circle(Point2::new(3.0, 0.0), 1.0, "0");
        stack.begin_cycle().unwrap();
        stack.record_add(second).unwrap();
        stack.end_cycle().unwrap();
        assert!(!stack.can_redo());
    }

    #[test]
    fn depth_limit_drops_oldest_cycle() {
        let mut document = Document::new();
        let mut stack = UndoStack::new_with_capacity(2);
        for i in 0..3 {
            let id = document.add_circle(Point2::new(i as f64, 0.0), 1.0, "0");
            stack.begin_cycle().unwrap();
            stack.record_add(id).unwrap();
            stack.end_cycle().unwrap();
        }
        assert_eq!(stack.undo_depth(), 2);
    }
}
