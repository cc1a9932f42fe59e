//! User address type with `tru` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with {prefix}: {raw}")]
    MissingPrefix { prefix: &'static str, raw: String },

    #[error("address body is empty")]
    Empty,

    #[error("address contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A ledger account address, always prefixed with `tru`.
///
/// Addresses are compared and ordered bytewise, which is also the order in
/// which they appear inside composite store keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserAddress(String);

impl UserAddress {
    /// The standard prefix for all ledger addresses.
    pub const PREFIX: &'static str = "tru";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string is not a well-formed address. Use
    /// [`UserAddress::parse`] for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        match Self::parse(raw) {
            Ok(addr) => addr,
            Err(e) => panic!("invalid address: {e}"),
        }
    }

    /// Parse and validate an address.
    ///
    /// The body after the prefix must be non-empty ASCII alphanumerics or `_`.
    /// The `:` separator used by store keys can therefore never occur.
    pub fn parse(raw: impl Into<String>) -> Result<Self, AddressError> {
        let s = raw.into();
        let Some(body) = s.strip_prefix(Self::PREFIX) else {
            return Err(AddressError::MissingPrefix {
                prefix: Self::PREFIX,
                raw: s,
            });
        };
        if body.is_empty() {
            return Err(AddressError::Empty);
        }
        if let Some(c) = body.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
            return Err(AddressError::InvalidCharacter(c));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for UserAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserAddress {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<UserAddress> for String {
    fn from(addr: UserAddress) -> Self {
        addr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefixed_address() {
        let addr = UserAddress::parse("tru1alice").unwrap();
        assert_eq!(addr.as_str(), "tru1alice");
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!(matches!(
            UserAddress::parse("cosmos1alice"),
            Err(AddressError::MissingPrefix { .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_body_and_separators() {
        assert_eq!(UserAddress::parse("tru"), Err(AddressError::Empty));
        assert_eq!(
            UserAddress::parse("tru1a:b"),
            Err(AddressError::InvalidCharacter(':'))
        );
    }

    #[test]
    fn deserialize_validates_prefix() {
        assert!(decode_from_string("tru1bob").is_ok());
        assert!(decode_from_string("bob").is_err());
    }

    fn decode_from_string(raw: &str) -> Result<UserAddress, bincode::Error> {
        let bytes = bincode::serialize(&raw.to_string())?;
        bincode::deserialize(&bytes)
    }
}
