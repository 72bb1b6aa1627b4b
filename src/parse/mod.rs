//! Streaming HTML parsing.
//!
//! ```text
//! bytes ──► ChunkAssembler (UTF-8) ──► Tokenizer ──► tree rules ──► ParseEvent
//! ```
//!
//! The assembler never builds a tree; it reports `Open` / `Leaf` / `Close`
//! events and leaves materialization to the reconciler.

mod assembler;
mod entities;
mod tokenizer;

pub use assembler::{ChunkAssembler, DEFAULT_MAX_DEPTH, ParseEvent, is_void_element};
pub use entities::decode_entities;
