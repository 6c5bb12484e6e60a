//! Storage seam
//!
//! Every operation of the discussion core runs inside one [`UnitOfWork`]
//! obtained from a [`Storage`]. Units of work commit explicitly and roll back
//! when dropped, which is what makes the deletion cascade all-or-nothing.
//!
//! Collaborator lookups ([`crate::directory::MemberGate`],
//! [`crate::directory::BookCatalog`]) must not be made while a unit of work
//! is open: a store may implement both on one connection.

mod memory;
mod persistence;

pub use memory::MemoryStore;
pub use persistence::{Storage, UnitOfWork};
