//! Verification code delivery by email.

use platform::mail::SmtpMailer;

use crate::domain::repository::OtpDelivery;
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::AuthResult;

const SUBJECT: &str = "Your verification code";

#[derive(Clone)]
pub struct SmtpOtpDelivery {
    mailer: SmtpMailer,
}

impl SmtpOtpDelivery {
    pub fn new(mailer: SmtpMailer) -> Self {
        Self { mailer }
    }
}

impl OtpDelivery for SmtpOtpDelivery {
    async fn deliver(&self, address: &str, code: &OtpCode) -> AuthResult<()> {
        self.mailer
            .send_text(address, SUBJECT, render_body(code))
            .await?;
        Ok(())
    }
}

fn render_body(code: &OtpCode) -> String {
    format!(
        "Your verification code is {}.\n\nIf you did not request this code, you can ignore this email.\n",
        code.as_str()
    )
}
