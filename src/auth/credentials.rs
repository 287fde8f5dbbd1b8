use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

use super::Secret;
use crate::config::CredentialSchemes;
use crate::error::ApiError;
use crate::failure::DomainFailure;

/// Header carrying the identity in the header-pair binding
pub const USERNAME_HEADER: &str = "username";
/// Header carrying the base64 encoded secret in the header-pair binding
pub const PASSWORD_HEADER: &str = "password";

/// Identity/secret pair pulled from a request. Lives only until the
/// execution context factory consumes it.
pub struct Credentials {
    pub identity: String,
    pub secret: Secret,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: Secret::new(secret),
        }
    }

    /// Normalize either transport binding into a Credentials value.
    ///
    /// The header pair takes precedence as soon as one of its headers is
    /// present. Missing and malformed input are reported as different
    /// failures; neither is ever an authentication failure.
    pub fn from_headers(
        headers: &HeaderMap,
        schemes: CredentialSchemes,
    ) -> Result<Self, DomainFailure> {
        let username = headers.get(USERNAME_HEADER);
        let password = headers.get(PASSWORD_HEADER);

        if schemes.header_pair && (username.is_some() || password.is_some()) {
            return match (username, password) {
                (Some(username), Some(password)) => from_header_pair(username, password),
                _ => Err(DomainFailure::MissingCredentials),
            };
        }

        if schemes.basic {
            if let Some(authorization) = headers.get(AUTHORIZATION) {
                return from_basic(authorization);
            }
        }

        Err(DomainFailure::MissingCredentials)
    }
}

fn header_text<'a>(value: &'a HeaderValue, name: &str) -> Result<&'a str, DomainFailure> {
    value
        .to_str()
        .map_err(|_| DomainFailure::malformed(format!("{} header is not valid ASCII", name)))
}

fn decode_base64(encoded: &str) -> Result<String, DomainFailure> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| DomainFailure::malformed(e.to_string()))?;
    String::from_utf8(bytes).map_err(|_| DomainFailure::malformed("decoded secret is not valid UTF-8"))
}

fn from_header_pair(username: &HeaderValue, password: &HeaderValue) -> Result<Credentials, DomainFailure> {
    let identity = header_text(username, USERNAME_HEADER)?;
    let secret = decode_base64(header_text(password, PASSWORD_HEADER)?)?;
    Ok(Credentials::new(identity.trim(), secret))
}

fn from_basic(authorization: &HeaderValue) -> Result<Credentials, DomainFailure> {
    let value = header_text(authorization, "authorization")?;

    let (scheme, payload) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("basic") {
        // A bearer token or anything else carries no identity/secret pair
        return Err(DomainFailure::MissingCredentials);
    }

    let decoded = decode_base64(payload)?;
    let (identity, secret) = decoded
        .split_once(':')
        .ok_or_else(|| DomainFailure::malformed("basic credentials must be identity:secret"))?;

    Ok(Credentials::new(identity.trim(), secret))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &self.secret)
            .finish()
    }
}

/// Rejects the request before any handler logic when no usable credentials
/// are present.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Credentials
where
    CredentialSchemes: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let schemes = CredentialSchemes::from_ref(state);
        Credentials::from_headers(&parts.headers, schemes).map_err(|failure| {
            tracing::debug!("Rejected credentials on {} {}: {}", parts.method, parts.uri.path(), failure);
            ApiError::from(failure)
        })
    }
}
