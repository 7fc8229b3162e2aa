use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::{FailureLimiter, ResetRequestLimiter};
use crate::reset::PasswordResetService;
use crate::store::AccountStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountStore>,
    pub resets: PasswordResetService,
    pub reset_request_limiter: ResetRequestLimiter,
    pub otp_attempt_limiter: FailureLimiter,
    pub login_limiter: FailureLimiter,
}
