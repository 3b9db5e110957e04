//! Heuristic field extraction from forwarded lead-notification bodies.

use std::sync::LazyLock;

use regex::Regex;

use super::record::LeadRecord;
use super::rules::classify_tokens;

static RE_SPACE_REQUIRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)space required:\s*(.+)").unwrap());
static RE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4,}.*\d{5}").unwrap());
// Stricter than `^hi[,.:]?` on purpose: only a standalone "hi" opens the
// note, so "Hiya," and "History" lines do not.
static RE_GREETING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^hi(?:[,.:!]|\s|$)").unwrap());

const FROM_LABEL: &str = "from:";

/// Lines starting with one of these end the message note.
const MESSAGE_TERMINATORS: &[&str] = &["visit the marketing center", "space required"];

/// Extracts a lead record from a plain-text body.
///
/// Never fails: anything that cannot be found is left as an empty string.
/// The header-level sender fields stay empty; use [`extract_with_sender`]
/// when the message headers are available.
pub fn extract(body: &str) -> LeadRecord {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut record = LeadRecord::default();

    if let Some(block) = find_sender_block(&lines) {
        let tokens = block.split('|').map(str::trim).filter(|t| !t.is_empty());
        let classified = classify_tokens(tokens);

        record.phone = classified.phone;
        record.sender_email = classified.email;
        record.listing_id = classified.listing_id;

        let mut leftover = classified.leftover.into_iter();
        record.sender_name = leftover.next().unwrap_or_default();
        record.company = leftover.next().unwrap_or_default();
    }

    record.space_required = find_space_required(&lines).unwrap_or_default();
    record.listing_address = find_address(&lines).unwrap_or_default();
    record.message = find_message(&lines).unwrap_or_default();

    record.trimmed()
}

/// Extracts a lead record and fills in the header-level sender.
pub fn extract_with_sender(from_name: &str, from_email: &str, body: &str) -> LeadRecord {
    LeadRecord {
        actual_from_name: from_name.to_string(),
        actual_from_email: from_email.to_string(),
        ..extract(body)
    }
    .trimmed()
}

/// Finds the first `From:` line carrying a pipe and joins a wrapped
/// continuation line onto it. Returns the block without its label.
fn find_sender_block(lines: &[&str]) -> Option<String> {
    let index = lines.iter().position(|line| {
        line.get(..FROM_LABEL.len())
            .is_some_and(|label| label.eq_ignore_ascii_case(FROM_LABEL))
            && line.contains('|')
    })?;

    let mut block = lines[index][FROM_LABEL.len()..].trim().to_string();
    if let Some(next) = lines.get(index + 1).filter(|next| next.contains('|')) {
        block.push(' ');
        block.push_str(next);
    }

    Some(block)
}

fn find_space_required(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        RE_SPACE_REQUIRED
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

fn find_address(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| RE_ADDRESS.is_match(line))
        .map(|line| line.to_string())
}

fn find_message(lines: &[&str]) -> Option<String> {
    let start = lines.iter().position(|line| RE_GREETING.is_match(line))?;

    let collected: Vec<&str> = lines[start..]
        .iter()
        .copied()
        .take_while(|line| !is_message_terminator(line))
        .collect();

    Some(collected.join(" "))
}

fn is_message_terminator(line: &str) -> bool {
    let lower = line.to_lowercase();
    line.is_empty()
        || MESSAGE_TERMINATORS
            .iter()
            .any(|marker| lower.starts_with(marker))
}
