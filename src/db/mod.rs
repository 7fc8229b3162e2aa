pub mod accounts;
pub mod password_resets;
