//! Pure display and input helpers

use chrono::{DateTime, FixedOffset};
use regex::Regex;

/// Format an integer with thousands separators, e.g. `1234567` -> `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Remove HTML tags and decode entities, collapsing the result to one line.
pub fn strip_html(html: &str) -> String {
    let block_re = Regex::new(r"(?i)<br\s*/?>|</p>").unwrap();
    let tag_re = Regex::new(r"<[^>]*>").unwrap();

    let spaced = block_re.replace_all(html, " ");
    let text = tag_re.replace_all(&spaced, "");
    let decoded = html_escape::decode_html_entities(&text);

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// `Nov 2022` style date for profile join dates; `Unknown` when unparsable.
pub fn format_month_year(value: Option<&str>) -> String {
    value
        .and_then(parse_timestamp)
        .map(|dt| dt.format("%b %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// `2024-05-01 10:00` style timestamp for change history; raw value when
/// unparsable.
pub fn format_change_time(value: &str) -> String {
    parse_timestamp(value)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// Normalize a user-entered instance into an `https://host` base URL.
pub fn normalize_instance_url(input: &str) -> Result<String, String> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("Instance URL cannot be empty".to_string());
    }

    let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let re = Regex::new(r"^https?://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(:\d+)?$").unwrap();
    if !re.is_match(&url) {
        return Err(format!("Invalid instance URL format: {input}"));
    }

    Ok(url)
}
