/// In-memory identity provider
///
/// Accounts are keyed by lowercase email. Sign-up signs the new account in,
/// like the hosted provider does.

use super::{lock, FaultInjector, FaultPoint};
use crate::backend::{AuthError, IdentityProvider};
use crate::models::Principal;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    principal: Principal,
    disabled: bool,
}

/// Identity provider kept entirely in memory
#[derive(Clone)]
pub struct MemoryIdentityProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    current: Arc<watch::Sender<Option<Principal>>>,
    verification_emails: Arc<Mutex<Vec<String>>>,
    faults: FaultInjector,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::with_faults(FaultInjector::new())
    }
}

impl MemoryIdentityProvider {
    /// Creates a provider with no accounts and nobody signed in
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider sharing a fault injector
    pub fn with_faults(faults: FaultInjector) -> Self {
        let (current, _) = watch::channel(None);
        MemoryIdentityProvider {
            accounts: Arc::default(),
            current: Arc::new(current),
            verification_emails: Arc::default(),
            faults,
        }
    }

    /// Registers an account without signing it in
    pub fn seed_account(&self, email: &str, password: &str, email_verified: bool) -> Principal {
        let principal = Principal::new(
            Uuid::new_v4().simple().to_string(),
            email.to_string(),
            email_verified,
        );
        lock(&self.accounts).insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                principal: principal.clone(),
                disabled: false,
            },
        );
        principal
    }

    /// Marks an account's email as verified
    pub fn verify_email(&self, email: &str) -> bool {
        let mut accounts = lock(&self.accounts);
        let Some(account) = accounts.get_mut(&email.to_lowercase()) else {
            return false;
        };
        account.principal.email_verified = true;
        let verified = account.principal.clone();
        drop(accounts);

        self.current.send_if_modified(|current| match current {
            Some(principal) if principal.id == verified.id => {
                *principal = verified;
                true
            }
            _ => false,
        });
        true
    }

    /// Disables an account
    pub fn disable(&self, email: &str) {
        if let Some(account) = lock(&self.accounts).get_mut(&email.to_lowercase()) {
            account.disabled = true;
        }
    }

    /// Signs a principal in directly, bypassing credentials
    pub fn sign_in_as(&self, principal: Principal) {
        self.current.send_replace(Some(principal));
    }

    /// Emails that received a verification message, in order
    pub fn verification_emails(&self) -> Vec<String> {
        lock(&self.verification_emails).clone()
    }

    fn fault(&self, point: FaultPoint) -> Result<(), AuthError> {
        if self.faults.should_fail(point) {
            return Err(AuthError::Provider {
                code: "auth/network-request-failed".to_string(),
            });
        }
        Ok(())
    }
}

fn check_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        self.fault(FaultPoint::SignIn)?;
        check_email(email)?;

        let principal = {
            let accounts = lock(&self.accounts);
            let account = accounts
                .get(&email.to_lowercase())
                .ok_or(AuthError::UserNotFound)?;
            if account.disabled {
                return Err(AuthError::UserDisabled);
            }
            if account.password != password {
                return Err(AuthError::WrongPassword);
            }
            account.principal.clone()
        };

        self.current.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        self.fault(FaultPoint::SignUp)?;
        check_email(email)?;

        if lock(&self.accounts).contains_key(&email.to_lowercase()) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let principal = self.seed_account(email, password, false);
        self.current.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn send_verification(&self, principal: &Principal) -> Result<(), AuthError> {
        self.fault(FaultPoint::SendVerification)?;
        lock(&self.verification_emails).push(principal.email.clone());
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.fault(FaultPoint::SignOut)?;
        self.current.send_replace(None);
        Ok(())
    }

    fn current_principal(&self) -> Option<Principal> {
        self.current.borrow().clone()
    }

    fn auth_changes(&self) -> watch::Receiver<Option<Principal>> {
        self.current.subscribe()
    }
}
