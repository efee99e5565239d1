// fleetsync-api: Async client for the fleet control panel (REST + push events)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::PanelClient;
pub use error::Error;
pub use models::{AttackRecord, NewAttack, NewServer, RecordId, ServerRecord};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ChannelEvent, ConnectionState, EventChannel, RawEvent, ReconnectConfig};
