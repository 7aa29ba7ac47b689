//! Chat application module for learning a topic from an LLM professor.
//!
//! This module provides the REPL-facing pieces built on top of the client:
//!
//! - Topic lifecycle: start, converse, reset
//! - Slash commands for session control
//! - Configurable model, knowledge level, and temperature
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Transcript and client handle lifecycle
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, is_valid_temperature, parse_temperature};
pub use session::{SessionStats, TurnOutcome, TutorSession};
