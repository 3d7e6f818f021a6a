//! # Admin Console Core
//!
//! This library keeps a voice server's administration surface in sync with
//! the remote side. Each view (server status, settings, connected clients,
//! coalitions, bans, notifications) is fed by two uncoordinated sources: a
//! periodic pull and a topic-based push stream. The library reconciles them
//! so the console always shows the most recent authoritative state.
//!
//! ## Architecture Overview
//!
//! ### Push Wins
//! A push event is authoritative and applied unconditionally. A pull result
//! is applied only if no push was accepted while it was in flight, so a slow
//! poll can never overwrite newer state. See [`cache::DomainCache`].
//!
//! ### One Task Per View
//! Every mounted view runs a session task that owns its cache and multiplexes
//! push deliveries, pull completions, the poll timer and control messages in
//! one `select!` loop. Nothing is shared between sessions, so no locks are
//! needed. Unmounting releases the subscription and the timer.
//!
//! ### Fire-and-Forget Commands
//! Commands (kick, ban, start/stop, coalition edits, ...) never mutate local
//! state. Their effects arrive later as pushes or on the next poll; failures
//! surface as notifications.
//!
//! ## Module Organization
//!
//! ### Cache Module (`cache`)
//! Pull/push reconciliation with pull tickets.
//!
//! ### Session Module (`session`)
//! Mount/unmount lifecycle of a domain view and its sync loop.
//!
//! ### Notification Modules (`notifications`, `center`)
//! The id-keyed alert queue with expiry, and the task that drives it.
//!
//! ### Frequency Module (`frequency`)
//! The fixed-mask `DDD.DDD` overtype editor and frequency list drafts.
//!
//! ## Usage Example
//!
//! ```ignore
//! use srs_admin::{AdminConsole, SyncConfig};
//!
//! let console = AdminConsole::mount(facade, &SyncConfig::default())?;
//!
//! let mut roster = console.roster.watch();
//! while roster.changed().await.is_ok() {
//!     render(roster.borrow().as_ref());
//! }
//!
//! console.unmount().await;
//! ```

pub mod cache;
pub mod center;
pub mod commands;
pub mod config;
pub mod console;
pub mod domain;
pub mod error;
pub mod frequency;
pub mod notifications;
pub mod session;

#[cfg(test)]
mod testing;

pub use cache::{Applied, DomainCache, PullTicket};
pub use center::{mount_notifications, Notifier, NotificationView};
pub use commands::CommandDispatcher;
pub use config::SyncConfig;
pub use console::AdminConsole;
pub use domain::Domain;
pub use error::{FrequencyError, SyncError};
pub use frequency::{EditKey, FrequencyEditBuffer, FrequencyForm, FrequencyListDraft, FrequencyMaskEditor};
pub use notifications::{NotificationQueue, QueuedNotification};
pub use session::DomainView;
