//! The LibreAssistant model protocol.
//!
//! Two halves of one contract:
//!
//! - [`instructions`] tells the model how to speak: the mandatory JSON
//!   response format and the catalogue of registered plugins, each with
//!   an example invocation.
//! - [`parser`] interprets what the model said: one structured [`Action`]
//!   per turn, with malformed output surfaced as `Action::ParseError`
//!   rather than guessed at.
//!
//! The parser's assumptions only hold in practice if the instructions
//! were built from the same registry the controller dispatches against —
//! callers are expected to use both halves together.
//!
//! [`Action`]: libreassistant_core::Action

pub mod instructions;
pub mod parser;

pub use instructions::build_system_instructions;
pub use parser::parse;
