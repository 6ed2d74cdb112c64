//! Errors raised while building a token.
//!
//! Every variant is a caller-input problem: nothing here is transient and
//! retrying with the same request always fails the same way.

use num_bigint::{BigInt, ParseBigIntError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("You must provide a secret.")]
    MissingSecret,

    #[error("You must provide a stream ID.")]
    MissingStreamId,

    #[error("You must provide an expiration time --end_time or a lifetime --lifetime.")]
    MissingExpiration,

    #[error("start_time must be numeric or 'now'")]
    InvalidStartTime {
        value: String,
        #[source]
        source: Option<ParseBigIntError>,
    },

    #[error("end_time must be numeric.")]
    InvalidEndTime {
        value: String,
        #[source]
        source: Option<ParseBigIntError>,
    },

    #[error("lifetime must be numeric.")]
    InvalidLifetime {
        value: String,
        #[source]
        source: Option<ParseBigIntError>,
    },

    #[error("Token start time is equal to or after expiration time.")]
    WindowOrderError {
        start_time: BigInt,
        end_time: BigInt,
    },
}

impl TokenError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::MissingStreamId => "missing_stream_id",
            Self::MissingExpiration => "missing_expiration",
            Self::InvalidStartTime { .. } => "invalid_start_time",
            Self::InvalidEndTime { .. } => "invalid_end_time",
            Self::InvalidLifetime { .. } => "invalid_lifetime",
            Self::WindowOrderError { .. } => "window_order",
        }
    }
}
