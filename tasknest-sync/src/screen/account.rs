use crate::context::AppContext;
use crate::notice::{Action, Notice, NoticeSink};
use tasknest_shared::models::Principal;
use tasknest_shared::SyncResult;

/// Sign-in, sign-up and sign-out with user-facing notices
///
/// Screens switch on the resulting auth transition through the
/// [`Navigator`](crate::Navigator); this screen only reports outcomes.
#[derive(Clone)]
pub struct AccountScreen {
    ctx: AppContext,
    notices: NoticeSink,
}

impl AccountScreen {
    pub fn new(ctx: &AppContext, notices: NoticeSink) -> Self {
        AccountScreen {
            ctx: ctx.clone(),
            notices,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> SyncResult<Principal> {
        match self.ctx.identity().sign_in(email, password).await {
            Ok(principal) => {
                self.notices.emit(Notice::account_success(
                    Action::SignIn,
                    format!("Signed in as {}.", principal.email),
                ));
                Ok(principal)
            }
            Err(e) => {
                self.notices.emit(Notice::account_failure(Action::SignIn, &e));
                Err(e)
            }
        }
    }

    /// Creates an account; the user is asked to verify their email
    pub async fn sign_up(&self, email: &str, password: &str) -> SyncResult<Principal> {
        match self.ctx.identity().sign_up(email, password).await {
            Ok(principal) => {
                self.notices.emit(Notice::account_success(
                    Action::SignUp,
                    "Account created. Check your email to verify your account.",
                ));
                Ok(principal)
            }
            Err(e) => {
                self.notices.emit(Notice::account_failure(Action::SignUp, &e));
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) -> SyncResult<()> {
        match self.ctx.identity().sign_out().await {
            Ok(()) => {
                self.notices
                    .emit(Notice::account_success(Action::SignOut, "Signed out."));
                Ok(())
            }
            Err(e) => {
                self.notices.emit(Notice::account_failure(Action::SignOut, &e));
                Err(e)
            }
        }
    }
}
