use std::fmt::Debug;

use tera::Context;
use tera::Tera;

use crate::domain::Rate;
use crate::domain::SubscriberEmail;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum ComposeError {
    #[error("could not render {0} template")]
    Template(&'static str, #[source] tera::Error),
}

impl Debug for ComposeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// One email to every subscriber. Built per send request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: SubscriberEmail,
    /// Order is kept all the way down to the `RCPT TO` sequence
    pub to: Vec<SubscriberEmail>,
    pub subject: String,
    pub body: String,
}

fn render(
    name: &'static str,
    template: &str,
    context: &Context,
) -> Result<String, ComposeError> {
    // plain text email, so no html escaping
    Tera::one_off(template, context, false).map_err(|e| ComposeError::Template(name, e))
}

impl EmailMessage {
    /// Render both templates with `{{ rate }}` (two decimals). Any other
    /// variable is an error, as is a template that does not parse.
    pub fn compose(
        from: SubscriberEmail,
        to: Vec<SubscriberEmail>,
        subject_template: &str,
        body_template: &str,
        rate: Rate,
    ) -> Result<Self, ComposeError> {
        let mut context = Context::new();
        context.insert("rate", &rate.to_string());

        Ok(Self {
            from,
            to,
            subject: render("subject", subject_template, &context)?,
            body: render("body", body_template, &context)?,
        })
    }

    /// RFC 5322-style headers, a blank line, then the body, with CRLF line
    /// endings throughout. The same message always serializes to the same
    /// bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let to = self
            .to
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(",");
        let body = self.body.replace("\r\n", "\n").replace('\n', "\r\n");
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}",
            self.from, to, self.subject, body
        )
        .into_bytes()
    }
}
