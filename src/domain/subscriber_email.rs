use std::fmt::Display;

/// An email address, used both for subscribers (recipients) and the sender.
///
/// The address is otherwise opaque: it is only required to be non-empty, and
/// identity is the exact string (case-sensitive). Surrounding whitespace from
/// form input is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        let trimmed = email.trim();
        match trimmed.is_empty() {
            true => Err(format!("Invalid email: {email:?}")),
            false => Ok(Self(trimmed.to_string())),
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
