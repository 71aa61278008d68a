/// Identity context
///
/// Wraps the identity provider and exposes:
/// - the current principal (`current_principal`, `require_principal`)
/// - auth-change listeners that receive the known state immediately and then
///   every sign-in/sign-out transition
/// - the account flows (sign in, sign up, sign out)
///
/// Transitions are observed through a watch channel, so a burst of rapid
/// transitions may be coalesced; listeners always end on the latest state.
///
/// # Example
///
/// ```no_run
/// use tasknest_sync::AppContext;
///
/// # async fn example(ctx: AppContext) -> Result<(), Box<dyn std::error::Error>> {
/// let subscription = ctx.identity().on_auth_change(|principal| {
///     println!("signed in: {}", principal.is_some());
/// });
///
/// ctx.identity().sign_in("user@example.com", "secret1").await?;
///
/// subscription.close().await;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use tasknest_shared::backend::{AuthError, IdentityProvider};
use tasknest_shared::models::Principal;
use tasknest_shared::{SyncError, SyncResult};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

/// Current principal and account flows
#[derive(Clone)]
pub struct IdentityContext {
    provider: Arc<dyn IdentityProvider>,
    require_verified_email: bool,
}

impl IdentityContext {
    /// Creates an identity context over a provider
    pub fn new(provider: Arc<dyn IdentityProvider>, require_verified_email: bool) -> Self {
        IdentityContext {
            provider,
            require_verified_email,
        }
    }

    /// Currently signed-in principal
    pub fn current_principal(&self) -> Option<Principal> {
        self.provider.current_principal()
    }

    /// Current principal, or `Unauthenticated`
    pub fn require_principal(&self) -> SyncResult<Principal> {
        self.current_principal().ok_or(SyncError::Unauthenticated)
    }

    /// Stream of auth states, starting with the current one
    pub fn changes(&self) -> WatchStream<Option<Principal>> {
        WatchStream::new(self.provider.auth_changes())
    }

    /// Registers an auth-change listener
    ///
    /// The listener is invoked synchronously with the current state before
    /// this returns, then from a background task on every transition until
    /// the returned handle is closed or dropped.
    pub fn on_auth_change<F>(&self, mut listener: F) -> AuthSubscription
    where
        F: FnMut(Option<Principal>) + Send + 'static,
    {
        let mut changes = self.provider.auth_changes();
        let initial = changes.borrow_and_update().clone();
        listener(initial);

        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let token = token.clone();
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        changed = changes.changed() => {
                            if changed.is_err() {
                                tracing::debug!("Identity provider dropped, stopping auth listener");
                                break;
                            }
                        }
                    }

                    let principal = changes.borrow_and_update().clone();
                    listener(principal);
                }
            }
        });

        AuthSubscription {
            token,
            handle: Some(handle),
        }
    }

    /// Signs in with email and password
    ///
    /// # Errors
    ///
    /// - Provider errors (wrong password, unknown user, ...)
    /// - `EmailNotVerified` when verification is required and missing; the
    ///   principal is signed back out in that case
    pub async fn sign_in(&self, email: &str, password: &str) -> SyncResult<Principal> {
        let principal = self.provider.sign_in(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, code = e.code(), "Sign-in failed");
            e
        })?;

        if self.require_verified_email && !principal.email_verified {
            tracing::info!(principal = %principal.id, "Refusing sign-in with unverified email");
            self.provider.sign_out().await?;
            return Err(AuthError::EmailNotVerified.into());
        }

        tracing::info!(principal = %principal.id, "Signed in");
        Ok(principal)
    }

    /// Creates an account and sends the verification email
    ///
    /// When verified emails are required the new account is signed back out
    /// so it has to sign in again once verified.
    ///
    /// # Errors
    ///
    /// - Provider errors (email in use, weak password, ...)
    /// - `VerificationEmailFailed` when the account exists but the email
    ///   could not be sent
    pub async fn sign_up(&self, email: &str, password: &str) -> SyncResult<Principal> {
        let principal = self.provider.sign_up(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, code = e.code(), "Sign-up failed");
            e
        })?;

        tracing::info!(principal = %principal.id, "Account created");

        let sent = self.provider.send_verification(&principal).await;

        // Unverified accounts never stay signed in, whether or not the email went out
        if self.require_verified_email && !principal.email_verified {
            self.provider.sign_out().await?;
        }

        if let Err(e) = sent {
            tracing::error!(principal = %principal.id, error = %e, "Failed to send verification email");
            return Err(AuthError::VerificationEmailFailed(e.to_string()).into());
        }

        Ok(principal)
    }

    /// Signs the current principal out
    pub async fn sign_out(&self) -> SyncResult<()> {
        self.provider.sign_out().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Raw receiver of auth states
    pub fn watch(&self) -> watch::Receiver<Option<Principal>> {
        self.provider.auth_changes()
    }
}

/// Handle keeping an auth-change listener alive
///
/// Dropping the handle stops future deliveries; [`close`](Self::close)
/// additionally waits until the listener task has exited.
pub struct AuthSubscription {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl AuthSubscription {
    /// Stops delivery and waits for the listener task to exit
    pub async fn close(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Auth listener panicked");
                }
            }
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
