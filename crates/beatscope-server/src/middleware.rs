//! Request ids, operator bearer keys, and the throttle on manual collection
//! triggers. Rejections use the same [`ApiError`] envelope as the handlers.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;

const API_KEYS_VAR: &str = "BEATSCOPE_API_KEYS";
const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

const TRIGGER_BURST: u32 = 3;
const TRIGGER_REFILL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Keeps a caller-supplied id when it is short printable ASCII.
    fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_REQUEST_ID_LEN
                    && id.bytes().all(|b| b.is_ascii_graphic())
            });
        Self(supplied.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned))
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |id| id.0.clone())
}

pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let echoed = HeaderValue::from_str(&id.0);
    req.extensions_mut().insert(id);

    let mut res = next.run(req).await;
    if let Ok(value) = echoed {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Bearer keys accepted on operator routes. With no keys the routes are
/// open, which only development allows.
#[derive(Debug, Clone)]
pub struct OperatorKeys {
    keys: Option<Arc<HashSet<String>>>,
}

impl OperatorKeys {
    /// Reads comma-separated keys from `BEATSCOPE_API_KEYS`.
    ///
    /// # Errors
    ///
    /// Fails outside development when no key is configured.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        Self::parse(
            &std::env::var(API_KEYS_VAR).unwrap_or_default(),
            is_development,
        )
    }

    /// # Errors
    ///
    /// Fails outside development when `raw` holds no key.
    pub fn parse(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                keys: Some(Arc::new(keys)),
            }),
            (true, true) => {
                tracing::warn!("{API_KEYS_VAR} not set; operator routes are open");
                Ok(Self { keys: None })
            }
            (true, false) => anyhow::bail!("{API_KEYS_VAR} is required outside development"),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.keys.is_none()
    }

    fn admits(&self, headers: &HeaderMap) -> bool {
        let Some(keys) = &self.keys else {
            return true;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .is_some_and(|token| keys.contains(token))
    }
}

pub async fn require_operator_key(
    State(keys): State<OperatorKeys>,
    req: Request,
    next: Next,
) -> Response {
    if keys.admits(req.headers()) {
        return next.run(req).await;
    }
    ApiError::new(
        request_id_of(&req),
        "unauthorized",
        "missing or invalid bearer token",
    )
    .into_response()
}

/// Token bucket in front of `POST /collect`: `burst` triggers back to back,
/// then one more per `refill`.
#[derive(Debug, Clone)]
pub struct TriggerThrottle {
    burst: u32,
    refill: Duration,
    bucket: Arc<Mutex<Bucket>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    refilled_at: Instant,
}

impl Default for TriggerThrottle {
    fn default() -> Self {
        Self::new(TRIGGER_BURST, TRIGGER_REFILL)
    }
}

impl TriggerThrottle {
    #[must_use]
    pub fn new(burst: u32, refill: Duration) -> Self {
        Self {
            burst,
            refill,
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: burst,
                refilled_at: Instant::now(),
            })),
        }
    }

    /// Takes one token at `now`; `false` when none is left.
    fn take(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = now.saturating_duration_since(bucket.refilled_at);
        let earned =
            u32::try_from(elapsed.as_nanos() / self.refill.as_nanos().max(1)).unwrap_or(u32::MAX);
        if earned > 0 {
            bucket.tokens = bucket.tokens.saturating_add(earned).min(self.burst);
            // Below `burst`, `earned` is small enough to multiply.
            bucket.refilled_at = if bucket.tokens == self.burst {
                now
            } else {
                bucket.refilled_at + self.refill * earned
            };
        }
        if bucket.tokens == 0 {
            return false;
        }
        bucket.tokens -= 1;
        true
    }
}

pub async fn throttle_trigger(
    State(throttle): State<TriggerThrottle>,
    req: Request,
    next: Next,
) -> Response {
    if throttle.take(Instant::now()) {
        return next.run(req).await;
    }
    tracing::warn!("collection trigger throttled");
    ApiError::new(
        request_id_of(&req),
        "rate_limited",
        "too many collection triggers; retry later",
    )
    .into_response()
}
