#![forbid(unsafe_code)]

//! Grouped undo/redo history.
//!
//! # Invariants
//!
//! 1. A block reaches the undo stack only when the nesting depth returns to
//!    zero and at least one command was recorded inside it.
//! 2. Recording a new command clears the redo stack (new branch).
//! 3. `apply` always executes its command; recording is orthogonal.
//! 4. `undo`, `redo`, and `clear` are never called with a block open.
//!
//! # Failure Modes
//!
//! - **Open block on undo/redo**: a caller bug; the log panics instead of
//!   replaying history into a half-built step.
//! - **Unbalanced `end_block`**: ignored with a warning.

use std::collections::VecDeque;
use std::fmt;

use super::command::UndoableCmd;

/// Limits for the transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LogConfig {
    /// Maximum number of undo entries kept; oldest entries are evicted.
    pub max_depth: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl LogConfig {
    /// Keep at most `max_depth` undo entries.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Never evict history.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}

/// One user-visible undo step: commands in execution order.
pub struct Transaction<C> {
    commands: Vec<C>,
}

impl<C: UndoableCmd> Transaction<C> {
    /// Number of commands in the step.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when the step holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Description of the first command, used as the step's label.
    #[must_use]
    pub fn description(&self) -> &str {
        self.commands.first().map_or("", |c| c.description())
    }

    fn undo(&mut self, target: &mut C::Target) {
        for cmd in self.commands.iter_mut().rev() {
            tracing::trace!(command = cmd.description(), "undo command");
            cmd.undo(target);
        }
    }

    fn redo(&mut self, target: &mut C::Target) {
        for cmd in &mut self.commands {
            tracing::trace!(command = cmd.description(), "redo command");
            cmd.redo(target);
        }
    }
}

impl<C: UndoableCmd> fmt::Debug for Transaction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field(
                "commands",
                &self
                    .commands
                    .iter()
                    .map(|c| c.description())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Undo manager with nested grouping and an enable gate.
///
/// Recording starts disabled so that setup code can run without leaving
/// history behind.
pub struct TransactionLog<C> {
    enabled: bool,
    depth: usize,
    open: Vec<C>,
    undo_stack: VecDeque<Transaction<C>>,
    redo_stack: Vec<Transaction<C>>,
    config: LogConfig,
}

impl<C: UndoableCmd> fmt::Debug for TransactionLog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionLog")
            .field("enabled", &self.enabled)
            .field("depth", &self.depth)
            .field("open_commands", &self.open.len())
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<C: UndoableCmd> Default for TransactionLog<C> {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl<C: UndoableCmd> TransactionLog<C> {
    /// Create a disabled log with the given limits.
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        Self {
            enabled: false,
            depth: 0,
            open: Vec::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            config,
        }
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Start recording applied commands.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop recording; applied commands still execute.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// True when applied commands are recorded.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current nesting depth of open blocks.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open a (possibly nested) block.
    pub fn begin_block(&mut self) {
        self.depth += 1;
    }

    /// Close a block; the outermost close commits it as one undo step.
    pub fn end_block(&mut self) {
        if self.depth == 0 {
            tracing::warn!("end_block called without a matching begin_block");
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            let commands = std::mem::take(&mut self.open);
            self.commit(commands);
        }
    }

    /// Execute `cmd` against `target`, recording it when enabled.
    ///
    /// A recorded command applied outside any block becomes its own step.
    pub fn apply(&mut self, mut cmd: C, target: &mut C::Target) {
        cmd.execute(target);
        if !self.enabled {
            return;
        }
        self.redo_stack.clear();
        if self.depth > 0 {
            self.open.push(cmd);
        } else {
            self.commit(vec![cmd]);
        }
    }

    fn commit(&mut self, commands: Vec<C>) {
        if commands.is_empty() {
            return;
        }
        tracing::debug!(
            commands = commands.len(),
            undo_depth = self.undo_stack.len() + 1,
            "commit undo step"
        );
        self.undo_stack.push_back(Transaction { commands });
        while self.undo_stack.len() > self.config.max_depth {
            self.undo_stack.pop_front();
        }
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Revert the most recent step. Returns false when there is nothing to undo.
    ///
    /// # Panics
    ///
    /// Panics if a block is still open.
    pub fn undo(&mut self, target: &mut C::Target) -> bool {
        assert!(self.depth == 0, "undo called while a transaction block is open");
        let Some(mut step) = self.undo_stack.pop_back() else {
            return false;
        };
        tracing::debug!(
            step = step.description(),
            commands = step.len(),
            "undo step"
        );
        step.undo(target);
        self.redo_stack.push(step);
        true
    }

    /// Re-apply the most recently undone step. Returns false when there is
    /// nothing to redo.
    ///
    /// # Panics
    ///
    /// Panics if a block is still open.
    pub fn redo(&mut self, target: &mut C::Target) -> bool {
        assert!(self.depth == 0, "redo called while a transaction block is open");
        let Some(mut step) = self.redo_stack.pop() else {
            return false;
        };
        tracing::debug!(
            step = step.description(),
            commands = step.len(),
            "redo step"
        );
        step.redo(target);
        self.undo_stack.push_back(step);
        true
    }

    /// Drop both stacks.
    ///
    /// # Panics
    ///
    /// Panics if a block is still open.
    pub fn clear(&mut self) {
        assert!(self.depth == 0, "clear called while a transaction block is open");
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// True when a step can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// True when a step can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the step `undo` would revert.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(Transaction::description)
    }

    /// Label of the step `redo` would re-apply.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(Transaction::description)
    }

    /// The log's limits.
    #[must_use]
    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Appends its name to a journal of strings; undo pops it again.
    struct Push(&'static str);

    impl UndoableCmd for Push {
        type Target = Vec<String>;

        fn execute(&mut self, target: &mut Vec<String>) {
            target.push(self.0.to_string());
        }

        fn undo(&mut self, target: &mut Vec<String>) {
            let popped = target.pop();
            assert_eq!(popped.as_deref(), Some(self.0), "undo out of order");
        }

        fn description(&self) -> &str {
            self.0
        }
    }

    fn enabled_log() -> TransactionLog<Push> {
        let mut log = TransactionLog::default();
        log.enable();
        log
    }

    #[test]
    fn disabled_log_executes_without_recording() {
        let mut log = TransactionLog::default();
        let mut journal = Vec::new();
        log.begin_block();
        log.apply(Push("a1"), &mut journal);
        log.end_block();
        assert_eq!(journal, vec!["a1"]);
        assert!(!log.can_undo());
    }

    #[test]
    fn block_undoes_and_redoes_as_one_step() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.begin_block();
        log.apply(Push("a1"), &mut journal);
        log.apply(Push("a2"), &mut journal);
        log.end_block();
        assert_eq!(log.undo_depth(), 1);

        assert!(log.undo(&mut journal));
        assert!(journal.is_empty());
        assert_eq!(log.redo_depth(), 1);

        assert!(log.redo(&mut journal));
        assert_eq!(journal, vec!["a1", "a2"]);
        assert_eq!(log.undo_depth(), 1);
        assert_eq!(log.redo_depth(), 0);
    }

    #[test]
    fn nested_blocks_collapse_to_one_entry() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.begin_block();
        log.apply(Push("outer"), &mut journal);
        log.begin_block();
        log.apply(Push("inner"), &mut journal);
        log.end_block();
        assert_eq!(log.undo_depth(), 0, "inner close must not commit");
        log.end_block();
        assert_eq!(log.undo_depth(), 1);
        assert_eq!(log.next_undo_description(), Some("outer"));
    }

    #[test]
    fn empty_block_produces_no_entry() {
        let mut log = enabled_log();
        log.begin_block();
        log.begin_block();
        log.end_block();
        log.end_block();
        assert!(!log.can_undo());
    }

    #[test]
    fn apply_outside_block_is_its_own_step() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.apply(Push("x"), &mut journal);
        log.apply(Push("y"), &mut journal);
        assert_eq!(log.undo_depth(), 2);
        log.undo(&mut journal);
        assert_eq!(journal, vec!["x"]);
    }

    #[test]
    fn new_command_clears_redo() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.apply(Push("a"), &mut journal);
        log.undo(&mut journal);
        assert!(log.can_redo());
        log.apply(Push("b"), &mut journal);
        assert!(!log.can_redo());
        assert_eq!(journal, vec!["b"]);
    }

    #[test]
    fn undo_redo_on_empty_stacks_are_noops() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        assert!(!log.undo(&mut journal));
        assert!(!log.redo(&mut journal));
    }

    #[test]
    #[should_panic(expected = "transaction block is open")]
    fn undo_with_open_block_panics() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.apply(Push("a"), &mut journal);
        log.begin_block();
        log.undo(&mut journal);
    }

    #[test]
    #[should_panic(expected = "transaction block is open")]
    fn redo_with_open_block_panics() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.begin_block();
        log.redo(&mut journal);
    }

    #[test]
    fn unmatched_end_block_is_ignored() {
        let mut log = enabled_log();
        log.end_block();
        assert_eq!(log.depth(), 0);
    }

    #[test]
    fn clear_drops_history() {
        let mut log = enabled_log();
        let mut journal = Vec::new();
        log.apply(Push("a"), &mut journal);
        log.apply(Push("b"), &mut journal);
        log.undo(&mut journal);
        log.clear();
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert_eq!(journal, vec!["a"]);
    }

    #[test]
    fn max_depth_evicts_oldest() {
        let mut log = TransactionLog::new(LogConfig::new(2));
        log.enable();
        let mut journal = Vec::new();
        for name in ["a", "b", "c"] {
            log.apply(Push(name), &mut journal);
        }
        assert_eq!(log.undo_depth(), 2);
        log.undo(&mut journal);
        log.undo(&mut journal);
        assert!(!log.undo(&mut journal));
        assert_eq!(journal, vec!["a"]);
    }

    #[test]
    fn debug_impl() {
        let log: TransactionLog<Push> = TransactionLog::default();
        let dbg = format!("{log:?}");
        assert!(dbg.contains("TransactionLog"));
        assert!(dbg.contains("undo_depth"));
    }
}
