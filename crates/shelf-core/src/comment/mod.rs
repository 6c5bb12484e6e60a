//! Comment system module
//!
//! Top-level comments and one-level replies share one model; a reply is a
//! comment whose `parent` is set.

pub mod model;
pub mod store;
pub mod validator;

pub use model::*;
pub use store::CommentStore;
pub use validator::ContentValidator;
