#![forbid(unsafe_code)]

//! Runtime plumbing for panesync: transactional undo and change notification.
//!
//! # Key Components
//!
//! - [`TransactionLog`] - nested undo blocks over [`UndoableCmd`] values
//! - [`ChangeNotifier`] - weakly held, ordered change subscribers
//!
//! Neither component knows about panes or rows; the alignment engine in
//! `panesync-align` supplies the commands and payload types.

pub mod signal;
pub mod undo;

pub use signal::{ChangeNotifier, Subscription};
pub use undo::{LogConfig, Transaction, TransactionLog, UndoableCmd};
