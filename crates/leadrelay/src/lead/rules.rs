//! Ordered classification rules for tokens of a forwarded sender block.
//!
//! A forwarded block such as
//! `From: Jane Doe | Acme Co | 555-123-4567 | jane@acme.com | (Listing ID : 123)`
//! is split on `|` and each token is offered to the rules in order. The first
//! rule whose field is still unclaimed and whose pattern matches takes the
//! token; tokens nobody takes are kept as leftovers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// The field a token rule fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenField {
    Phone,
    Email,
    ListingId,
}

/// A single (pattern, field) classification rule.
#[derive(Debug)]
pub struct TokenRule {
    field: TokenField,
    pattern: Regex,
    /// Capture group holding the value; 0 means the whole match.
    group: usize,
}

impl TokenRule {
    fn new(field: TokenField, pattern: &str, group: usize) -> Self {
        Self {
            field,
            pattern: Regex::new(pattern).unwrap(),
            group,
        }
    }

    /// Returns the field this rule fills.
    pub fn field(&self) -> TokenField {
        self.field
    }

    /// Returns the trimmed value this rule extracts from `token`, if it matches.
    pub fn capture(&self, token: &str) -> Option<String> {
        self.pattern
            .captures(token)
            .and_then(|caps| caps.get(self.group))
            .map(|m| m.as_str().trim().to_string())
    }
}

static TOKEN_RULES: LazyLock<Vec<TokenRule>> = LazyLock::new(|| {
    vec![
        TokenRule::new(
            TokenField::Phone,
            r"(?:\+?\d{1,3}[-.\s]?)?(?:\(\d{3}\)|\d{3})[-.\s]?\d{3}[-.\s]?\d{4}",
            0,
        ),
        TokenRule::new(
            TokenField::Email,
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            0,
        ),
        TokenRule::new(TokenField::ListingId, r"(?i)\(Listing ID\s*:\s*(.*?)\)", 1),
    ]
});

/// Returns the token rules in precedence order.
pub fn token_rules() -> &'static [TokenRule] {
    &TOKEN_RULES
}

/// Result of classifying the tokens of one sender block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifiedTokens {
    pub phone: String,
    pub email: String,
    pub listing_id: String,
    /// Unclaimed tokens in their original order.
    pub leftover: Vec<String>,
}

impl ClassifiedTokens {
    fn set(&mut self, field: TokenField, value: String) {
        match field {
            TokenField::Phone => self.phone = value,
            TokenField::Email => self.email = value,
            TokenField::ListingId => self.listing_id = value,
        }
    }
}

/// Classifies tokens against [`token_rules`]. Each field is filled at most once.
pub fn classify_tokens<'a, I>(tokens: I) -> ClassifiedTokens
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = ClassifiedTokens::default();
    let mut claimed: HashSet<TokenField> = HashSet::new();

    'tokens: for token in tokens {
        for rule in token_rules() {
            if claimed.contains(&rule.field()) {
                continue;
            }
            if let Some(value) = rule.capture(token) {
                claimed.insert(rule.field());
                result.set(rule.field(), value);
                continue 'tokens;
            }
        }
        result.leftover.push(token.to_string());
    }

    result
}
