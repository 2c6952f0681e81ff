//! Email/password authentication and session tokens.
//!
//! # Security
//! - Plaintext passwords arrive wrapped in `SecretString` and are never
//!   logged or exposed in debug output
//! - Stored as salted SHA-256 digests, compared with `subtle` so neither a
//!   mismatch position nor a length difference leaks through timing
//! - Session tokens are opaque v4 UUIDs held server-side only

mod extractor;

pub use extractor::AuthUser;

use std::collections::HashMap;
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated identity, before any role is attached.
#[derive(Debug, Clone)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

struct Account {
    uid: String,
    email: String,
    salt: String,
    password_hash: String,
}

/// In-process account and session registry.
///
/// Interior mutability via std locks: every critical section is a map lookup
/// or insert, nothing awaits while holding a guard.
#[derive(Default)]
pub struct AuthService {
    // keyed by normalized (lowercased, trimmed) email
    accounts: RwLock<HashMap<String, Account>>,
    // token -> principal
    sessions: RwLock<HashMap<String, Principal>>,
}

impl AuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account. The caller decides what happens next
    /// (profile write, session issue).
    pub fn sign_up(&self, email: &str, password: &SecretString) -> AppResult<Principal> {
        let email = normalize_email(email)?;
        if password.expose_secret().len() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut accounts = lock_write(&self.accounts);
        if accounts.contains_key(&email) {
            return Err(AppError::AlreadyExists(format!(
                "an account for {} already exists",
                email
            )));
        }

        let uid = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().to_string();
        let account = Account {
            uid: uid.clone(),
            email: email.clone(),
            password_hash: hash_password(&salt, password.expose_secret()),
            salt,
        };
        accounts.insert(email.clone(), account);
        Ok(Principal { uid, email })
    }

    /// Verify credentials. The error never says which of email or password
    /// was wrong.
    pub fn sign_in(&self, email: &str, password: &SecretString) -> AppResult<Principal> {
        let email = normalize_email(email)?;
        let accounts = lock_read(&self.accounts);
        let account = accounts
            .get(&email)
            .ok_or_else(|| AppError::Unauthorized("wrong email or password".to_string()))?;

        let provided = hash_password(&account.salt, password.expose_secret());
        let matches: bool = provided
            .as_bytes()
            .ct_eq(account.password_hash.as_bytes())
            .into();
        if !matches {
            return Err(AppError::Unauthorized(
                "wrong email or password".to_string(),
            ));
        }
        Ok(Principal {
            uid: account.uid.clone(),
            email: account.email.clone(),
        })
    }

    /// Issue an opaque session token for a principal.
    pub fn create_session(&self, principal: &Principal) -> String {
        let token = Uuid::new_v4().to_string();
        lock_write(&self.sessions).insert(token.clone(), principal.clone());
        token
    }

    /// Resolve a session token back to its principal.
    pub fn verify_session(&self, token: &str) -> Option<Principal> {
        lock_read(&self.sessions).get(token).cloned()
    }

    /// Drop a session. Unknown tokens are a no-op; logout is idempotent.
    pub fn revoke_session(&self, token: &str) {
        lock_write(&self.sessions).remove(token);
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(AppError::InvalidInput(format!(
            "{} is not a valid email address",
            email
        )));
    }
    Ok(email)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn lock_read<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_write<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_sign_up_then_sign_in() {
        let auth = AuthService::new();
        let created = auth.sign_up("Jo@Example.com", &secret("hunter22")).unwrap();
        assert_eq!(created.email, "jo@example.com");

        let signed_in = auth.sign_in("jo@example.com", &secret("hunter22")).unwrap();
        assert_eq!(signed_in.uid, created.uid);
    }

    #[test]
    fn test_wrong_password_rejected() {
        let auth = AuthService::new();
        auth.sign_up("jo@example.com", &secret("hunter22")).unwrap();
        let err = auth
            .sign_in("jo@example.com", &secret("wrong-pass"))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_unknown_email_rejected_identically() {
        let auth = AuthService::new();
        let err = auth
            .sign_in("nobody@example.com", &secret("hunter22"))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let auth = AuthService::new();
        auth.sign_up("jo@example.com", &secret("hunter22")).unwrap();
        let err = auth
            .sign_up("JO@example.com", &secret("different-pass"))
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[test]
    fn test_invalid_email_and_weak_password() {
        let auth = AuthService::new();
        assert!(matches!(
            auth.sign_up("not-an-email", &secret("hunter22")),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.sign_up("jo@example.com", &secret("short")),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let auth = AuthService::new();
        let principal = auth.sign_up("jo@example.com", &secret("hunter22")).unwrap();
        let token = auth.create_session(&principal);

        assert_eq!(
            auth.verify_session(&token).map(|p| p.uid),
            Some(principal.uid)
        );
        auth.revoke_session(&token);
        assert!(auth.verify_session(&token).is_none());
        // Idempotent.
        auth.revoke_session(&token);
    }
}
