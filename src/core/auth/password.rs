//! Password verification capability
//!
//! The login flow only needs to answer "does this plaintext match the stored
//! hash"; storage format is owned by whoever implements [`PasswordVerifier`].

/// Cost factor for bcrypt hashing (12 is recommended for production)
pub const BCRYPT_COST: u32 = 12;

/// Checks a plaintext password against a stored hash
pub trait PasswordVerifier: Send + Sync + 'static {
    fn verify(&self, plaintext: &str, stored_hash: &str) -> bool;
}

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

/// bcrypt-backed verifier
#[derive(Debug, Clone, Copy)]
pub struct BcryptVerifier {
    cost: u32,
}

impl BcryptVerifier {
    pub fn new() -> Self {
        Self { cost: BCRYPT_COST }
    }

    /// Verifier hashing with a custom cost (lower costs keep tests fast)
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::HashingError(e.to_string()))
    }
}

impl Default for BcryptVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordVerifier for BcryptVerifier {
    fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        match bcrypt::verify(plaintext, stored_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Stored password hash could not be checked: {}", e);
                false
            }
        }
    }
}
