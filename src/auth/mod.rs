// Authenticated command gateway: credentials in, execution context out.

pub mod context;
pub mod credentials;
pub mod verifier;

pub use context::{ContextFactory, ExecutionContext};
pub use credentials::Credentials;
pub use verifier::{IdentityVerifier, SuVerifier, VerifyError};

use std::fmt;

/// Secret half of a credential pair. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Portable POSIX user name: `[A-Za-z_][A-Za-z0-9_.-]*` with an optional
/// trailing `$`, at most 32 bytes. Anything else cannot name an account and
/// must never reach a command line.
pub fn is_valid_identity(identity: &str) -> bool {
    let name = identity.strip_suffix('$').unwrap_or(identity);
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    identity.len() <= 32 && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
