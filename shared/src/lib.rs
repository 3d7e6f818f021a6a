//! # Shared Admin Protocol
//!
//! Types and contracts shared by the admin sync core (`srs-admin`) and any
//! implementation of the remote side (`srs-server` in this workspace).
//!
//! - [`domain`]: the snapshot types for each independently synchronized
//!   slice of server state, plus notifications
//! - [`protocol`]: push topics and the command set
//! - [`facade`]: the [`RemoteFacade`] call surface and the scoped
//!   [`Subscription`] guard
//! - [`envelope`]: normalization of the push payload shapes seen on the wire
//! - [`error`]: transport and payload errors

pub mod domain;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod protocol;

pub use domain::{
    BannedClient, ClientState, Coalition, FrequencyKind, FrequencySettings, Level, Notification,
    Roster, ServerSetting, ServerSettings, ServerStatus, ServiceStatus, Settings,
    ValidationError,
};
pub use envelope::decode_payload;
pub use error::{PayloadError, RemoteError};
pub use facade::{RemoteFacade, Subscription};
pub use protocol::{Command, Topic};
