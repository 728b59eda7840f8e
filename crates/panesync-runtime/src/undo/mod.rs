#![forbid(unsafe_code)]

//! Transactional undo/redo.
//!
//! Reversible operations are expressed as [`UndoableCmd`] values that own
//! everything they need (indices plus value snapshots) and act on a target
//! passed in at execution time. A [`TransactionLog`] executes them and groups
//! them into blocks so that one user-visible step may span many commands.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      TransactionLog                         │
//! │   open block (depth > 0)                                    │
//! │   ┌──────────────┐                                          │
//! │   │ cmd, cmd ... │ ── end_block() at depth 0 ──┐            │
//! │   └──────────────┘                             ▼            │
//! │  ┌──────────────────┐   undo()   ┌──────────────────┐       │
//! │  │   Undo Stack     │ ─────────► │   Redo Stack     │       │
//! │  │  [block, block]  │ ◄───────── │  [block, block]  │       │
//! │  └──────────────────┘   redo()   └──────────────────┘       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Notes
//!
//! Commands never hold references into the structure they edit. The log
//! borrows the target only for the duration of `apply`, `undo`, or `redo`,
//! so the owner can keep the log and the target as sibling fields.

pub mod command;
pub mod log;

pub use command::UndoableCmd;
pub use log::{LogConfig, Transaction, TransactionLog};
