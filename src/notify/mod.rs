mod email;
mod sms;

pub use email::SmtpEmailSender;
pub use sms::TwilioSmsSender;
