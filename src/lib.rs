//! Signed `hdnts` stream tokens.
//!
//! A token grants access to one stream for a bounded window and is checked
//! by the edge with the same shared secret:
//!
//! ```
//! use stream_token::{FixedClock, TokenBuilder, TokenRequest};
//!
//! let request = TokenRequest::new("YourStreamId", "demosecret123abc")
//!     .with_start_time(1578935505)
//!     .with_end_time(1578935593);
//! let token = TokenBuilder::new(FixedClock(0)).generate(request).unwrap();
//! assert!(token.as_str().starts_with("hdnts=st=1578935505~exp=1578935593~hmac="));
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::TokenError;
pub use num_bigint::BigInt;
pub use token::{
    canonical_message, generate, sign, CanonicalMessage, ResolvedWindow, Token, TokenBuilder,
    TokenRequest,
};
