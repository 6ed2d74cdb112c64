//! Token construction.
//!
//! A token looks like
//! `hdnts=[vod=<vod>~][ip=<ip>~][st=<start>~]exp=<end>~hmac=<hex>` where the
//! hmac is HMAC-SHA256 over the field block followed by `~stream_id=<id>`.
//! The stream id suffix is signed but never emitted; the edge rebuilds it
//! from the request path.

use crate::clock::{Clock, SystemClock};
use crate::error::TokenError;
use hmac::{Hmac, Mac};
use num_bigint::{BigInt, ParseBigIntError, Sign};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_PREFIX: &str = "hdnts=";
pub const FIELD_DELIMITER: &str = "~";

/// Everything needed to issue one token.
///
/// Time fields hold the operator-supplied text and are only parsed by
/// [`TokenBuilder::generate`]. `vod_stream_id` and `ip` distinguish absent
/// (`None`) from present-but-empty (`Some("")`); the latter is still emitted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenRequest {
    pub stream_id: Option<String>,
    pub secret: Vec<u8>,
    pub vod_stream_id: Option<String>,
    pub ip: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub lifetime: Option<String>,
}

impl TokenRequest {
    pub fn new(stream_id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            stream_id: Some(stream_id.into()),
            secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn with_vod_stream_id(mut self, vod: impl Into<String>) -> Self {
        self.vod_stream_id = Some(vod.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Start of validity, as epoch seconds or `now` (any case)
    pub fn with_start_time(mut self, start: impl ToString) -> Self {
        self.start_time = Some(start.to_string());
        self
    }

    pub fn with_end_time(mut self, end: impl ToString) -> Self {
        self.end_time = Some(end.to_string());
        self
    }

    /// Validity in seconds; ignored when an end time is given
    pub fn with_lifetime(mut self, lifetime: impl ToString) -> Self {
        self.lifetime = Some(lifetime.to_string());
        self
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("stream_id", &self.stream_id)
            .field("secret", &"<redacted>")
            .field("vod_stream_id", &self.vod_stream_id)
            .field("ip", &self.ip)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Validity window after parsing and lifetime derivation.
///
/// Seconds are unbounded integers: an operator may pass any decimal and it
/// is emitted exactly as parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start_time: Option<BigInt>,
    pub end_time: BigInt,
}

/// The exact text that gets signed, split into its emitted and hidden parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage {
    /// `[vod=..~][ip=..~][st=..~]exp=..`, emitted verbatim in the token
    pub token_fields: String,
    pub stream_id: String,
}

impl CanonicalMessage {
    /// Bytes fed to the HMAC
    pub fn hash_source(&self) -> String {
        format!(
            "{}{}stream_id={}",
            self.token_fields, FIELD_DELIMITER, self.stream_id
        )
    }
}

/// A signed, ready-to-use token string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// HMAC-SHA256 of `message` keyed by `secret`, as lowercase hex
pub fn sign(secret: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Generate a token against the system clock
pub fn generate(request: TokenRequest) -> Result<Token, TokenError> {
    TokenBuilder::system().generate(request)
}

/// Builds tokens from requests. Stateless apart from the clock.
#[derive(Debug, Clone, Default)]
pub struct TokenBuilder<C = SystemClock> {
    clock: C,
}

impl TokenBuilder<SystemClock> {
    pub fn system() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> TokenBuilder<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Validate the request and produce the signed token.
    pub fn generate(&self, request: TokenRequest) -> Result<Token, TokenError> {
        let window = self.resolve_window(&request)?;
        // resolve_window has already rejected a missing stream id
        let stream_id = request.stream_id.as_deref().unwrap_or_default();
        let message = canonical_message(&request, stream_id, &window);
        let digest = sign(&request.secret, &message.hash_source());

        tracing::debug!(
            start_time = ?window.start_time.as_ref().map(|s| s.to_string()),
            end_time = %window.end_time,
            vod = request.vod_stream_id.is_some(),
            ip = request.ip.is_some(),
            "token generated"
        );

        Ok(Token(format!(
            "{}{}{}hmac={}",
            TOKEN_PREFIX, message.token_fields, FIELD_DELIMITER, digest
        )))
    }

    /// Run the validation steps up to and including window resolution.
    ///
    /// Checks secret, then stream id, then parses start, end and lifetime
    /// in that order; the first failure is returned.
    pub fn resolve_window(&self, request: &TokenRequest) -> Result<ResolvedWindow, TokenError> {
        if request.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if request.stream_id.is_none() {
            return Err(TokenError::MissingStreamId);
        }

        let mut now = LazyNow::new(&self.clock);

        let start_time = match request.start_time.as_deref() {
            Some(raw) if raw.eq_ignore_ascii_case("now") => Some(BigInt::from(now.get())),
            Some(raw) => Some(parse_seconds(raw).map_err(|source| {
                TokenError::InvalidStartTime {
                    value: raw.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        let end_time = match request.end_time.as_deref() {
            Some(raw) => Some(parse_seconds(raw).map_err(|source| {
                TokenError::InvalidEndTime {
                    value: raw.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        let lifetime = match request.lifetime.as_deref() {
            Some(raw) => Some(parse_integer(raw).map_err(|source| {
                TokenError::InvalidLifetime {
                    value: raw.to_string(),
                    source: Some(source),
                }
            })?),
            None => None,
        };

        let end_time = match (end_time, lifetime) {
            (Some(end_time), _) => {
                if let Some(start_time) = &start_time {
                    if *start_time >= end_time {
                        return Err(TokenError::WindowOrderError {
                            start_time: start_time.clone(),
                            end_time,
                        });
                    }
                }
                end_time
            }
            (None, Some(lifetime)) => {
                let base = match &start_time {
                    Some(start_time) => start_time.clone(),
                    None => BigInt::from(now.get()),
                };
                // Not re-checked against the start time; only a negative expiry is refused.
                let end_time = base + &lifetime;
                if end_time.sign() == Sign::Minus {
                    return Err(TokenError::InvalidLifetime {
                        value: lifetime.to_string(),
                        source: None,
                    });
                }
                end_time
            }
            (None, None) => return Err(TokenError::MissingExpiration),
        };

        Ok(ResolvedWindow {
            start_time,
            end_time,
        })
    }
}

/// Assemble the field block in vod, ip, st, exp order.
pub fn canonical_message(
    request: &TokenRequest,
    stream_id: &str,
    window: &ResolvedWindow,
) -> CanonicalMessage {
    let mut fields: Vec<String> = Vec::with_capacity(4);
    if let Some(vod) = &request.vod_stream_id {
        fields.push(format!("vod={}", vod));
    }
    if let Some(ip) = &request.ip {
        fields.push(format!("ip={}", ip));
    }
    if let Some(start_time) = &window.start_time {
        fields.push(format!("st={}", start_time));
    }
    fields.push(format!("exp={}", window.end_time));

    CanonicalMessage {
        token_fields: fields.join(FIELD_DELIMITER),
        stream_id: stream_id.to_string(),
    }
}

/// Reads the clock on first use only
struct LazyNow<'a, C: Clock> {
    clock: &'a C,
    cached: Option<i64>,
}

impl<'a, C: Clock> LazyNow<'a, C> {
    fn new(clock: &'a C) -> Self {
        Self {
            clock,
            cached: None,
        }
    }

    fn get(&mut self) -> i64 {
        let clock = self.clock;
        *self.cached.get_or_insert_with(|| clock.now())
    }
}

fn parse_integer(raw: &str) -> Result<BigInt, ParseBigIntError> {
    raw.trim().parse::<BigInt>()
}

/// Epoch seconds: an integer that must not be negative
fn parse_seconds(raw: &str) -> Result<BigInt, Option<ParseBigIntError>> {
    match parse_integer(raw) {
        Ok(secs) if secs.sign() != Sign::Minus => Ok(secs),
        Ok(_) => Err(None),
        Err(e) => Err(Some(e)),
    }
}
