pub fn render_password_reset_otp(name: &str, otp: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset Request</h2>
    <p>Hello <strong>{name}</strong>,</p>
    <p>We received a request to reset your Maintenix password. Use the code below to continue:</p>
    <p style="font-size: 32px; font-weight: 700; letter-spacing: 8px; text-align: center; padding: 16px; background: #f4f4f8; border-radius: 8px;">{otp}</p>
    <p><strong>This code is valid for {ttl_minutes} minutes.</strong></p>
    <p style="color: #666; font-size: 14px;">If you didn't request this, you can ignore this email.</p>
</body>
</html>"#
    )
}
