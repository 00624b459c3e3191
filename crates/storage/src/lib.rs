//! In-memory ternary search tree over a contiguous node arena.
//!
//! This crate is the storage half of terndb: the fixed-width node
//! record, the grow-only arena addressed by 32-bit indices, the
//! insert/lookup/tombstone core, the ordered and wildcard traversals,
//! and the maintenance surface (balance metric, shuffle rebuild,
//! diagnostic dump). It knows nothing about files; durability lives in
//! `tern-durability` and is wired up by `tern-engine`.
//!
//! ## Shape
//!
//! Nodes live in one dense `Vec` and point at each other with `u32`
//! indices instead of pointers, so the whole tree is a single
//! relocatable allocation and a node is 16 bytes instead of 32.
//! Index 0 is the nil sentinel; the root is allocated at index 1 by
//! the first insertion. Removal only clears the terminating flag;
//! structural nodes are reclaimed wholesale by [`Tree::clear`] or the
//! shuffle rebuild, never individually.

pub mod arena;
mod balance;
mod dump;
pub mod node;
pub mod tree;
pub mod walk;

pub use node::{Node, NIL, ROOT};
pub use tree::Tree;
pub use walk::Direction;
