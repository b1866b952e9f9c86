pub mod mailer;

pub use mailer::{LogMailOutput, Mail, MailOutput, Mailer};
