//! Builders for lead notification emails.

#![allow(dead_code)]

/// Sender used by the listing service in these tests.
pub const NOTIFIER: &str = "Listing Alerts <alerts@listings.example>";

/// Filter that matches [`NOTIFIER`].
pub const TARGET: &str = "alerts@listings.example";

/// A body with a complete forwarded sender block.
pub const JANE_BODY: &str = "\
You have a new inquiry.

From: Jane Doe | Acme Co | 555-123-4567 | jane@acme.com | (Listing ID : 123)
1234 Main Street, Houston, TX 77002
Hi, I need a warehouse near the port.
Space Required: 2,000 sq ft

Visit the Marketing Center to reply.";

/// A body with no forwarded sender block.
pub const NO_SENDER_BODY: &str = "\
Your weekly listing report is ready.
Views: 42";

/// Builder for RFC 5322 lead notification messages.
pub struct EmailBuilder {
    from: String,
    message_id: Option<String>,
    subject: String,
    body: String,
}

impl EmailBuilder {
    /// A notification from [`NOTIFIER`] carrying [`JANE_BODY`].
    pub fn new() -> Self {
        Self {
            from: NOTIFIER.to_string(),
            message_id: Some("<lead-1@listings.example>".to_string()),
            subject: "New lead for 1234 Main Street".to_string(),
            body: JANE_BODY.to_string(),
        }
    }

    pub fn from(mut self, from: &str) -> Self {
        self.from = from.to_string();
        self
    }

    pub fn message_id(mut self, id: &str) -> Self {
        self.message_id = Some(id.to_string());
        self
    }

    pub fn without_message_id(mut self) -> Self {
        self.message_id = None;
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut text = format!("From: {}\r\nTo: leads@example.com\r\n", self.from);
        if let Some(id) = &self.message_id {
            text.push_str(&format!("Message-ID: {}\r\n", id));
        }
        text.push_str(&format!(
            "Subject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n",
            self.subject
        ));
        text.push_str(&self.body.replace('\n', "\r\n"));
        text.push_str("\r\n");
        text.into_bytes()
    }
}

impl Default for EmailBuilder {
    fn default() -> Self {
        Self::new()
    }
}
