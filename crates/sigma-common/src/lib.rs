//! Shared data model for the Sigma compiler.
//!
//! Every later stage (lexer, parser, analyzer, IR generator, driver) builds
//! on the types in this crate: byte-offset spans with on-demand line/column
//! lookup, the token vocabulary, and lexical errors.

pub mod error;
pub mod span;
pub mod token;
