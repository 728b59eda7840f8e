#![forbid(unsafe_code)]

//! The reversible command contract.
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` restores the prior target state exactly
//! - `undo()` followed by `redo()` restores the executed state exactly
//!
//! Commands are free to move data between themselves and the target while
//! executing (a command may stash the rows it replaced and hand them back on
//! undo), which is why both directions take `&mut self`.

/// A reversible edit of some target structure.
pub trait UndoableCmd {
    /// The structure this command edits.
    type Target: ?Sized;

    /// Apply the command's forward effect.
    fn execute(&mut self, target: &mut Self::Target);

    /// Revert the command's effect.
    fn undo(&mut self, target: &mut Self::Target);

    /// Re-apply the command after it was undone.
    fn redo(&mut self, target: &mut Self::Target) {
        self.execute(target);
    }

    /// Human-readable description for UI display.
    fn description(&self) -> &str;
}
