//! Session context for note access.
//!
//! # Responsibility
//! - Turn the auth collaborator's current user into an explicit `Session`.
//! - Reject note operations when nobody is signed in.
//!
//! # Invariants
//! - A `Session` always holds a non-blank `UserId`.
//! - Sessions are passed explicitly; core never reads ambient auth state.

use crate::model::note::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Signed-in user as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Identity collaborator contract.
pub trait AuthProvider {
    /// Returns the signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;
    /// Ends the current sign-in.
    fn sign_out(&mut self);
}

/// Raised when a note operation is attempted without an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequired;

impl Display for AuthRequired {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("an authenticated session is required for note operations")
    }
}

impl Error for AuthRequired {}

/// Authenticated session scoping every note operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    email: Option<String>,
}

impl Session {
    /// Builds a session from a raw user id.
    ///
    /// The id is opaque and stored unchanged; only blankness is checked.
    ///
    /// # Errors
    /// - Returns `AuthRequired` when `user_id` is blank.
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Result<Self, AuthRequired> {
        let user_id = UserId::new(user_id);
        if user_id.is_blank() {
            return Err(AuthRequired);
        }
        Ok(Self { user_id, email })
    }

    /// Captures the auth collaborator's current user.
    ///
    /// # Errors
    /// - Returns `AuthRequired` when no user is signed in.
    pub fn from_auth(auth: &impl AuthProvider) -> Result<Self, AuthRequired> {
        let user = auth.current_user().ok_or(AuthRequired)?;
        Self::new(user.id, user.email)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
