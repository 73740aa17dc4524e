//! Per-account undo/redo stacks
//!
//! The `CommandEngine` owns one stack pair per account number. It performs no
//! balance arithmetic and takes no locks of its own beyond the map shard: the
//! ledger service calls it only while holding the relevant account locks, so
//! a peek followed by a commit on the same account cannot interleave with
//! another request.
//!
//! # Stack discipline
//!
//! - Recording a fresh command pushes onto undo and clears redo.
//! - Committing an undo moves the top of undo onto redo.
//! - Committing a redo moves the top of redo back onto undo without clearing
//!   the rest of redo.
//! - The undo stack is bounded by `undo_depth`; past the bound the oldest
//!   command is evicted.

use super::commands::Command;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct StackPair {
    /// Oldest at the front, newest at the back
    undo: VecDeque<Command>,
    redo: Vec<Command>,
}

/// Snapshot of an account's stack sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRedoStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_stack_size: usize,
    pub redo_stack_size: usize,
}

/// Table of undo/redo stack pairs keyed by account number
#[derive(Debug, Default)]
pub struct CommandEngine {
    stacks: DashMap<String, StackPair>,
    /// Maximum undo stack size, `None` for unbounded
    undo_depth: Option<usize>,
}

impl CommandEngine {
    pub fn new(undo_depth: Option<usize>) -> Self {
        Self {
            stacks: DashMap::new(),
            undo_depth,
        }
    }

    /// Record a freshly applied command
    pub fn record(&self, command: Command) {
        let mut pair = self
            .stacks
            .entry(command.account_number.clone())
            .or_default();
        pair.redo.clear();
        pair.undo.push_back(command);
        Self::evict(&mut pair.undo, self.undo_depth);
    }

    /// Command that the next undo would reverse
    pub fn peek_undo(&self, account_number: &str) -> Option<Command> {
        self.stacks
            .get(account_number)
            .and_then(|pair| pair.undo.back().cloned())
    }

    /// Command that the next redo would re-apply
    pub fn peek_redo(&self, account_number: &str) -> Option<Command> {
        self.stacks
            .get(account_number)
            .and_then(|pair| pair.redo.last().cloned())
    }

    /// Move the top undo command onto the redo stack
    pub fn commit_undo(&self, account_number: &str) -> Option<Command> {
        let mut pair = self.stacks.get_mut(account_number)?;
        let command = pair.undo.pop_back()?;
        pair.redo.push(command.clone());
        Some(command)
    }

    /// Move the top redo command back onto the undo stack
    pub fn commit_redo(&self, account_number: &str) -> Option<Command> {
        let mut pair = self.stacks.get_mut(account_number)?;
        let command = pair.redo.pop()?;
        pair.undo.push_back(command.clone());
        Self::evict(&mut pair.undo, self.undo_depth);
        Some(command)
    }

    pub fn status(&self, account_number: &str) -> UndoRedoStatus {
        let (undo, redo) = self
            .stacks
            .get(account_number)
            .map(|pair| (pair.undo.len(), pair.redo.len()))
            .unwrap_or((0, 0));
        UndoRedoStatus {
            can_undo: undo > 0,
            can_redo: redo > 0,
            undo_stack_size: undo,
            redo_stack_size: redo,
        }
    }

    /// Drop both stacks of an account
    pub fn discard(&self, account_number: &str) {
        self.stacks.remove(account_number);
    }

    fn evict(undo: &mut VecDeque<Command>, depth: Option<usize>) {
        if let Some(depth) = depth {
            while undo.len() > depth {
                undo.pop_front();
            }
        }
    }
}
