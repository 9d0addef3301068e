//! The access gate: canonical-host redirect, then HTTP Basic Auth, then pass-through.
//!
//! Every request is decided on its own. Nothing is cached between requests, no cookie or
//! token is issued, and every authentication failure produces the same `401`.

use crate::canonical::CanonicalHost;
use crate::config::GateConfig;
use crate::credentials::{SharedSecret, parse_basic_authorization};
use crate::error::{GateError, Result};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse as _, Response},
};
use std::sync::Arc;

/// What to do with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// `301` to the canonical host.
    Redirect { location: String },
    /// `401` with a `WWW-Authenticate` challenge.
    Challenge,
    /// Hand the request to the next handler untouched.
    PassThrough,
}

pub struct AccessGate {
    secret: SharedSecret,
    canonical: CanonicalHost,
    challenge: HeaderValue,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("canonical", &self.canonical)
            .field("challenge", &self.challenge)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    /// Build a gate from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`GateConfig::validate`].
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", config.realm))
            .map_err(|e| GateError::Config(format!("realm is not a valid header value: {e}")))?;
        Ok(Self {
            secret: config.password,
            canonical: CanonicalHost::new(&config.canonical_host, &config.preview_suffix),
            challenge,
        })
    }

    #[must_use]
    pub fn canonical(&self) -> &CanonicalHost {
        &self.canonical
    }

    /// Decide a request from its host, request target and headers.
    ///
    /// The redirect check runs first and ignores credentials entirely.
    #[must_use]
    pub fn decide(&self, host: Option<&str>, path_and_query: &str, headers: &HeaderMap) -> Decision {
        if let Some(location) =
            host.and_then(|h| self.canonical.preview_redirect(h, path_and_query))
        {
            return Decision::Redirect { location };
        }
        if self.is_authorized(headers) {
            Decision::PassThrough
        } else {
            Decision::Challenge
        }
    }

    /// True only for a well-formed Basic header whose password equals the shared secret.
    #[must_use]
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            return false;
        };
        parse_basic_authorization(value).is_ok_and(|creds| self.secret.matches(&creds.password))
    }

    #[must_use]
    pub fn challenge_response(&self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, self.challenge.clone())],
            "Unauthorized",
        )
            .into_response()
    }

    #[must_use]
    pub fn redirect_response(location: String) -> Response {
        (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
    }
}

/// Host the client addressed: the URI host when the request target carries one (absolute-form,
/// HTTP/2 `:authority`), else the `Host` header. RFC 9112 §3.2.2 has the target win over `Host`.
fn request_host(req: &Request) -> Option<&str> {
    req.uri().host().or_else(|| {
        req.headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
    })
}

/// Axum middleware enforcing the gate in front of whatever the router wraps.
pub async fn enforce(State(gate): State<Arc<AccessGate>>, req: Request, next: Next) -> Response {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    let decision = gate.decide(request_host(&req), path_and_query, req.headers());
    match decision {
        Decision::Redirect { location } => AccessGate::redirect_response(location),
        Decision::Challenge => gate.challenge_response(),
        Decision::PassThrough => next.run(req).await,
    }
}
