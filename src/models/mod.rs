pub mod account;
pub mod password_reset;

pub use account::{Account, NewAccount};
pub use password_reset::PasswordReset;
