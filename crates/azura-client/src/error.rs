use thiserror::Error;

/// Connection-level failure reported by a [`crate::transport::Transport`].
///
/// Distinct from an HTTP error status: a transport error means no usable
/// response arrived at all (refused connection, DNS failure, timeout, or a
/// broken body read). Only transport errors trigger the plain-http retry.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Everything the provider can fail with. Callers are expected to catch
/// these at the request boundary and fall back to
/// [`crate::provider::SongDataProvider::get_cached_history`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("server URL not configured")]
    MissingConfiguration,

    /// Both scheme attempts failed at the connection level.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("no usable station data in upstream response")]
    NoStationData,
}
