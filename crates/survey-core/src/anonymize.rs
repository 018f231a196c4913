//! Salted one-way hashing of client addresses.
//!
//! Responses carry `hex(sha256(address ‖ salt))` instead of the address, so
//! repeated submissions from one address can be correlated without the
//! address itself ever being stored.

use std::fmt;

use sha2::{Digest, Sha256};

/// Placeholder salt used when none is configured. Not fit for deployment.
pub const DEFAULT_IP_HASH_SALT: &str = "change-me";

/// Hash `ip` with `salt`. Returns `None` for an absent or empty address.
///
/// Any string is accepted; the output is always 64 lowercase hex characters.
pub fn anonymize_address(ip: Option<&str>, salt: &str) -> Option<String> {
  let ip = ip.filter(|ip| !ip.is_empty())?;
  let mut hasher = Sha256::new();
  hasher.update(ip.as_bytes());
  hasher.update(salt.as_bytes());
  Some(hex::encode(hasher.finalize()))
}

/// Holds the process-wide salt.
#[derive(Clone)]
pub struct AddressAnonymizer {
  salt: String,
}

impl AddressAnonymizer {
  pub fn new(salt: impl Into<String>) -> Self { Self { salt: salt.into() } }

  pub fn anonymize(&self, ip: Option<&str>) -> Option<String> {
    anonymize_address(ip, &self.salt)
  }

  /// `true` when running with [`DEFAULT_IP_HASH_SALT`].
  pub fn uses_default_salt(&self) -> bool { self.salt == DEFAULT_IP_HASH_SALT }
}

impl Default for AddressAnonymizer {
  fn default() -> Self { Self::new(DEFAULT_IP_HASH_SALT) }
}

// The salt is a secret.
impl fmt::Debug for AddressAnonymizer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AddressAnonymizer")
      .field("salt", &"<redacted>")
      .finish()
  }
}
