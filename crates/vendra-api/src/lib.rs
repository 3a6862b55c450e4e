// vendra-api: async client for the Vendra backend of record (REST tables + realtime feed)

pub mod error;
pub mod realtime;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use realtime::{
    ChangeEvent, ChangeKind, RealtimeConfig, RealtimeEvent, RealtimeHandle, ReconnectConfig,
};
pub use rest::RestClient;
pub use transport::{TlsMode, TransportConfig};
