/*
 * Responsibility
 * - split the bearer token into username/password
 * - format check only; whether the pair is valid is the directory's call
 */
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not in username:password form")]
    Malformed,
}

/// Credentials carried in a single request. The password is redacted from
/// `Debug` output so the pair can never leak through a log line.
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Split on the first `:`. The username part must be non-empty; the password
/// may be empty (the directory will simply not match it).
pub fn extract(token: &str) -> Result<Credential, TokenError> {
    let (username, password) = token.split_once(':').ok_or(TokenError::Malformed)?;
    if username.is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(Credential {
        username: username.to_string(),
        password: password.to_string(),
    })
}
