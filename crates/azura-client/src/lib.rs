//! Client for an AzuraCast server's `/api/nowplaying` endpoint.
//!
//! Fetches the current song and recent-song history for one station,
//! normalizes the loosely-specified upstream JSON into stable types, and
//! layers two caches on top: a short-TTL in-process cache (the fast path)
//! and a single persisted snapshot used as a fallback when the live fetch
//! fails. Presentation callers get [`SongDataProvider`] and decide for
//! themselves when to degrade to the persisted snapshot.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod transport;

pub use config::Config;
pub use error::{ProviderError, TransportError};
pub use model::{normalize_song, HistoryResult, LiveStatus, Song};
pub use provider::SongDataProvider;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
