use thiserror::Error;

/// Fatal, top-level failures. Per-datagram and per-send failures are logged
/// and dropped where they occur; they never surface as a `NodeError`.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("failed to bind udp socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reason a single datagram was rejected before or during dispatch.
/// Never escapes the handler: every variant is logged and swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame is not valid utf-8 / json")]
    NotTextual,

    #[error("top-level frame is not a record")]
    NotARecord,

    #[error("unrecognized msg_type: {0}")]
    UnknownKind(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("payload does not match msg_type {0}: {1}")]
    BadPayload(&'static str, String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
