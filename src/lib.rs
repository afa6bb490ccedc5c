//! WFRP GM Engine - LLM-backed game master core for WFRP 4E text campaigns
//!
//! The engine runs stateful Russian-language conversations between players
//! and an LLM narrator:
//!
//! - a character-creation state machine walks each conversation through the
//!   ordered build steps, answering side-channel rules questions without
//!   advancing state;
//! - per-conversation game sessions serialize narrative turns, feed the
//!   prompt builder with every character sheet in play, and fold the
//!   narrator's replies back into the sheets as bounds-checked updates;
//! - a watchdog stops sessions after prolonged inactivity.
//!
//! The chat transport (command parsing, message delivery) is a collaborator
//! that links against this library; see [`application::services`] for the
//! session and creation entry points.

pub mod application;
pub mod domain;
pub mod infrastructure;
