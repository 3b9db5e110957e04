//! Lead field extraction.
//!
//! Turns the loosely formatted body of a forwarded lead notification into a
//! [`LeadRecord`]. Extraction is a pure function of its input: no I/O, no
//! state, and no failure mode.

pub mod extractor;
pub mod record;
pub mod rules;

pub use extractor::{extract, extract_with_sender};
pub use record::LeadRecord;
pub use rules::{classify_tokens, token_rules, ClassifiedTokens, TokenField, TokenRule};
