//! Mock student login with attempt counting and a timed lockout.

use crate::roster::IdentityStore;
use crate::types::StudentProfile;
use std::time::{Duration, Instant};
use thiserror::Error;

const MIN_PASSWORD_LEN: usize = 6;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_LOCKOUT: Duration = Duration::from_secs(5 * 60);

/// Every variant's message is the notification shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("Enrollment ID is required")]
    MissingEnrollmentId,
    #[error("Password is required")]
    MissingPassword,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Account temporarily locked. Please try again later.")]
    Locked,
    #[error("Too many failed attempts. Account locked for {minutes} minutes.")]
    LockedOut { minutes: u64 },
    #[error("Invalid credentials. {remaining} attempts remaining.")]
    InvalidCredentials { remaining: u32 },
}

/// Tunables for [`LoginGate`].
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cooldown: DEFAULT_LOCKOUT,
        }
    }
}

/// Failed-attempt counter for the login form.
#[derive(Debug)]
pub struct LoginGate {
    policy: LockoutPolicy,
    attempts: u32,
    locked_until: Option<Instant>,
}

impl Default for LoginGate {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}

impl LoginGate {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            locked_until: None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the gate is locked at `now`. Expired locks are cleared.
    pub fn is_locked(&mut self, now: Instant) -> bool {
        match self.locked_until {
            Some(until) if now >= until => {
                tracing::info!("login lockout expired");
                self.locked_until = None;
                self.attempts = 0;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Form checks that run before the lock is consulted.
    pub fn validate(enrollment_id: &str, password: &str) -> Result<(), LoginError> {
        if enrollment_id.trim().is_empty() {
            return Err(LoginError::MissingEnrollmentId);
        }
        if password.trim().is_empty() {
            return Err(LoginError::MissingPassword);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LoginError::PasswordTooShort);
        }
        Ok(())
    }

    /// Check credentials against `store`.
    ///
    /// Validation failures do not count as attempts. A locked gate rejects
    /// even correct credentials.
    pub fn attempt<S>(
        &mut self,
        store: &S,
        enrollment_id: &str,
        password: &str,
        now: Instant,
    ) -> Result<StudentProfile, LoginError>
    where
        S: IdentityStore + ?Sized,
    {
        Self::validate(enrollment_id, password)?;
        if self.is_locked(now) {
            tracing::warn!(enrollment_id, "login rejected: locked");
            return Err(LoginError::Locked);
        }

        match store.lookup(enrollment_id) {
            Some(cred) if cred.password == password => {
                self.attempts = 0;
                Ok(cred.profile.clone())
            }
            _ => {
                self.attempts += 1;
                tracing::warn!(enrollment_id, attempts = self.attempts, "login failed");
                if self.attempts >= self.policy.max_attempts {
                    self.locked_until = Some(now + self.policy.cooldown);
                    Err(LoginError::LockedOut {
                        minutes: self.policy.cooldown.as_secs().div_ceil(60),
                    })
                } else {
                    Err(LoginError::InvalidCredentials {
                        remaining: self.policy.max_attempts - self.attempts,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Directory;

    #[test]
    fn test_valid_login() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let profile = gate
            .attempt(dir, "CS2021002", "password123", Instant::now())
            .unwrap();
        assert_eq!(profile.name, "Drishti Butani");
        assert_eq!(profile.year, "3rd Year");
    }

    #[test]
    fn test_validation_order_and_messages() {
        assert_eq!(
            LoginGate::validate("  ", "").unwrap_err().to_string(),
            "Enrollment ID is required"
        );
        assert_eq!(
            LoginGate::validate("CS2021001", " ").unwrap_err(),
            LoginError::MissingPassword
        );
        assert_eq!(
            LoginGate::validate("CS2021001", "abc").unwrap_err().to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_validation_failure_is_not_an_attempt() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let _ = gate.attempt(dir, "", "password123", Instant::now());
        assert_eq!(gate.attempts(), 0);
    }

    #[test]
    fn test_remaining_attempts_message() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let err = gate
            .attempt(dir, "CS2021001", "wrongpass", Instant::now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid credentials. 2 attempts remaining."
        );
    }

    #[test]
    fn test_three_failures_lock_out_correct_credentials() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let now = Instant::now();

        for _ in 0..2 {
            assert!(matches!(
                gate.attempt(dir, "CS2021001", "wrongpass", now),
                Err(LoginError::InvalidCredentials { .. })
            ));
        }
        let third = gate.attempt(dir, "CS2021001", "wrongpass", now).unwrap_err();
        assert_eq!(
            third.to_string(),
            "Too many failed attempts. Account locked for 5 minutes."
        );

        let fourth = gate.attempt(dir, "CS2021002", "password123", now).unwrap_err();
        assert_eq!(fourth, LoginError::Locked);
    }

    #[test]
    fn test_lock_expires_after_cooldown() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let start = Instant::now();
        for _ in 0..3 {
            let _ = gate.attempt(dir, "CS2021001", "wrongpass", start);
        }
        let almost = start + Duration::from_secs(299);
        assert_eq!(
            gate.attempt(dir, "CS2021002", "password123", almost),
            Err(LoginError::Locked)
        );

        let later = start + Duration::from_secs(300);
        assert!(gate.attempt(dir, "CS2021002", "password123", later).is_ok());
        assert_eq!(gate.attempts(), 0);
    }

    #[test]
    fn test_success_resets_counter() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let now = Instant::now();
        let _ = gate.attempt(dir, "CS2021003", "wrongpass", now);
        assert_eq!(gate.attempts(), 1);
        gate.attempt(dir, "CS2021003", "password123", now).unwrap();
        assert_eq!(gate.attempts(), 0);
    }

    #[test]
    fn test_unknown_enrollment_counts_as_failure() {
        let dir = Directory::demo();
        let mut gate = LoginGate::default();
        let _ = gate.attempt(dir, "XX0000000", "password123", Instant::now());
        assert_eq!(gate.attempts(), 1);
    }

    #[test]
    fn test_short_cooldown_rounds_up_to_a_minute() {
        let dir = Directory::demo();
        let mut gate = LoginGate::new(LockoutPolicy {
            max_attempts: 1,
            cooldown: Duration::from_secs(30),
        });
        let err = gate
            .attempt(dir, "CS2021001", "wrongpass", Instant::now())
            .unwrap_err();
        assert_eq!(err, LoginError::LockedOut { minutes: 1 });
    }
}
