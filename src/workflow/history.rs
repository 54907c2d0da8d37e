use super::definition::Workflow;
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// A recorded workflow state.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: u64,
    pub description: String,
    pub workflow: Workflow,
}

/// Bounded undo/redo stack of workflow snapshots.
///
/// `cursor` points at the entry describing the current state. Pushing after
/// an undo discards the redo tail.
#[derive(Debug, Clone)]
pub struct WorkflowHistory {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    max_entries: usize,
    next_id: u64,
}

impl Default for WorkflowHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl WorkflowHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            max_entries: max_entries.max(1),
            next_id: 0,
        }
    }

    /// Records a snapshot of `workflow` as the new current state.
    pub fn push(&mut self, workflow: &Workflow, description: impl Into<String>) -> u64 {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        } else {
            self.entries.clear();
        }

        self.next_id += 1;
        let entry = HistoryEntry {
            id: self.next_id,
            description: description.into(),
            workflow: workflow.clone(),
        };
        debug!(entry_id = entry.id, description = %entry.description, "Recorded history entry");
        self.entries.push_back(entry);

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
        self.next_id
    }

    /// Steps back one entry and returns the state to restore.
    pub fn undo(&mut self) -> Option<&Workflow> {
        let cursor = self.cursor.filter(|c| *c > 0)?;
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1).map(|e| &e.workflow)
    }

    /// Steps forward one entry and returns the state to restore.
    pub fn redo(&mut self) -> Option<&Workflow> {
        let next = self.cursor? + 1;
        if next >= self.entries.len() {
            return None;
        }
        self.cursor = Some(next);
        self.entries.get(next).map(|e| &e.workflow)
    }

    /// Moves the cursor to the entry with the given id.
    pub fn go_to(&mut self, entry_id: u64) -> Option<&Workflow> {
        let index = self.entries.iter().position(|e| e.id == entry_id)?;
        self.cursor = Some(index);
        self.entries.get(index).map(|e| &e.workflow)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
