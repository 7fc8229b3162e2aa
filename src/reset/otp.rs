use rand::Rng;

/// Number of digits in an OTP.
pub const OTP_LENGTH: usize = 6;

/// Six decimal digits, zero-padded, drawn uniformly from the thread CSPRNG.
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    format!("{code:06}")
}
