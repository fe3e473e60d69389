//! Arena memory management for the SQL front-end.
//!
//! A single type lives here: [`Arena`], a bump-pointer byte allocator with
//! geometric block growth and bulk reset. It stands on its own as a general
//! byte-block allocator, deliberately independent of the AST node model,
//! which is addressed by index and backed by its own text buffer (see
//! [`crate::ast::arena`]).

pub mod arena;

pub use arena::{Arena, ArenaError, ArenaStats};
