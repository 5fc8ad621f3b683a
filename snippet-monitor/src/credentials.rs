//! API token list parsing.
//!
//! Tokens arrive as a single comma separated string. They are secrets: the
//! only representation that ever reaches a log line or a diagnostic is the
//! masked suffix (`...abcd`).

use std::fmt;

use crate::{Error, Result};

/// Separator between tokens in the configured string.
pub const TOKEN_SEPARATOR: char = ',';

/// Number of trailing characters revealed by [`Credential::masked`].
const MASK_SUFFIX_LEN: usize = 4;

/// An opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw secret, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `...` followed by the last four characters of the token.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let start = chars.len().saturating_sub(MASK_SUFFIX_LEN);
        let suffix: String = chars[start..].iter().collect();
        format!("...{suffix}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Split a delimited token string into credentials.
///
/// Trims each token, drops empty ones, keeps order and duplicates.
pub fn parse_credentials(input: Option<&str>) -> Vec<Credential> {
    input
        .unwrap_or_default()
        .split(TOKEN_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Credential::new)
        .collect()
}

/// Non-empty, ordered set of credentials.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    credentials: Vec<Credential>,
}

impl CredentialSet {
    /// Parse the configured token string.
    ///
    /// Returns [`Error::ConfigMissing`] when nothing usable is configured.
    pub fn from_config(input: Option<&str>) -> Result<Self> {
        let credentials = parse_credentials(input);
        if credentials.is_empty() {
            return Err(Error::ConfigMissing);
        }
        Ok(Self { credentials })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.credentials.iter()
    }
}

impl<'a> IntoIterator for &'a CredentialSet {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
