//! # Reference Admin Service
//!
//! An in-process stand-in for the remote side of the voice server's admin
//! surface. It holds the authoritative state, executes admin commands and
//! emits push events and notifications exactly the way the console expects
//! them. There is no transport and no persistence.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! Server status, settings, coalitions, bans and the roster of connected
//! voice clients live in one [`state::AdminState`] behind a tokio `RwLock`.
//!
//! ### Push Events
//! Every successful change emits the affected domain topic with a full
//! snapshot, followed by a notification. Payloads can be wrapped in any of
//! the envelope shapes the console has to tolerate ([`EnvelopeStyle`]).
//!
//! ### Fault Injection
//! A fake latency delays fetches and commands, and an availability switch
//! makes them fail, so the console's reconciliation and error paths can be
//! exercised deterministically.

pub mod client_manager;
pub mod service;
pub mod state;

pub use client_manager::{ClientManager, VoiceClient};
pub use service::{AdminServer, EnvelopeStyle, ServerConfig};
pub use state::{AdminState, DEFAULT_MAX_CLIENTS};
