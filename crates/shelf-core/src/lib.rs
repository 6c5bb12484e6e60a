//! shelf-core - Core library for shelftalk
//!
//! Per-book discussion threads with top-level comments and one level of
//! replies, soft deletion with cascade, and an idempotent reconciliation
//! sweep. Persistence, member status and book metadata are reached through
//! traits so the core runs against any store.

pub mod cascade;
pub mod comment;
pub mod config;
pub mod directory;
pub mod error;
pub mod forum;
pub mod pagination;
pub mod reconcile;
pub mod store;
pub mod thread;
pub mod types;
pub mod withdrawal;

pub use cascade::{DeleteOutcome, DeletionCascade};
pub use config::Config;
pub use directory::{BookCatalog, BookSummary, MemberDirectory, MemberGate, MemberStatus};
pub use error::{ErrorKind, Result, ShelfError};
pub use forum::Forum;
pub use pagination::Cursor;
pub use reconcile::{ReconcileReport, Reconciler};
pub use store::{MemoryStore, Storage, UnitOfWork};
pub use types::*;
pub use withdrawal::{MemberWithdrawal, WithdrawalReport};
