//! Pool identifier and auth key generation
//!
//! Pool ids are UUIDv4. Auth keys are the externally presented secrets that
//! select a pool, so they come from the OS random number generator and must be
//! practically collision-free.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

/// Number of random bytes in a generated auth key (before encoding).
const AUTH_KEY_BYTES: usize = 32;

/// Default prefix for generated auth keys.
pub const DEFAULT_AUTH_KEY_PREFIX: &str = "pk-";

/// Generator for pool identifiers and auth keys.
pub trait KeyGenerator: Send + Sync {
    /// Generate a new unique pool identifier.
    fn pool_id(&self) -> String;

    /// Generate a new cryptographically unpredictable auth key.
    fn auth_key(&self) -> String;
}

/// Default generator: UUIDv4 pool ids, OS-random base64url auth keys.
#[derive(Debug, Clone)]
pub struct RandomKeyGenerator {
    prefix: String,
}

impl RandomKeyGenerator {
    /// Create a generator producing auth keys with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for RandomKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_KEY_PREFIX)
    }
}

impl KeyGenerator for RandomKeyGenerator {
    fn pool_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn auth_key(&self) -> String {
        let mut bytes = [0u8; AUTH_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(bytes))
    }
}
