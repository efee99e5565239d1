// fleetsync-core: Reactive state layer between fleetsync-api and consumers.

pub mod command;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{SessionConfig, TlsVerification};
pub use dispatch::{DispatchOutcome, Ignored, PushEvent};
pub use error::CoreError;
pub use session::Session;
pub use store::{Aggregates, AttackStats, DataStore, ServerStats, StoreSnapshot};
pub use stream::{AttackFilter, ServerFilter, StoreStream};

// Re-exported so consumers need not depend on fleetsync-api directly.
pub use fleetsync_api::models::{NewAttack, NewServer};
pub use fleetsync_api::websocket::{ChannelEvent, ConnectionState, RawEvent};

pub use model::{AttackJob, AttackStatus, EntityId, Server, ServerStatus};
