use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// One actionable recommendation scraped from the reply's list sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

/// Split a free-form reply into titled recommendations. A trimmed line
/// starting with a list marker (`1.`, `2)`, `-`, `*`, `•`) or an
/// `Uppercase…:` heading opens a new entry; following non-empty lines
/// accumulate into its description. Total: malformed input yields an
/// empty list, never an error.
pub fn parse_recommendations(text: &str) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let mut current: Option<Recommendation> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_title_line(trimmed) {
            if let Some(done) = current.take() {
                out.push(done);
            }
            current = Some(Recommendation {
                title: strip_title_prefix(trimmed),
                description: String::new(),
            });
        } else if let Some(rec) = current.as_mut() {
            if !rec.description.is_empty() {
                rec.description.push(' ');
            }
            rec.description.push_str(trimmed);
        }
    }

    if let Some(done) = current {
        out.push(done);
    }
    out
}

fn is_title_line(line: &str) -> bool {
    numbered_re().is_match(line) || bullet_re().is_match(line) || heading_re().is_match(line)
}

fn strip_title_prefix(line: &str) -> String {
    static NUMBER_PREFIX: OnceLock<Regex> = OnceLock::new();
    static BULLET_PREFIX: OnceLock<Regex> = OnceLock::new();
    let number_prefix = NUMBER_PREFIX
        .get_or_init(|| Regex::new(r"^\d+[.)]\s*").expect("number prefix regex is valid"));
    let bullet_prefix = BULLET_PREFIX
        .get_or_init(|| Regex::new(r"^[-*•]\s*").expect("bullet prefix regex is valid"));

    let stripped = number_prefix.replace(line, "");
    bullet_prefix.replace(&stripped, "").into_owned()
}

fn numbered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[.)]").expect("numbered line regex is valid"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*•]").expect("bullet line regex is valid"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][^.!?]*:").expect("heading line regex is valid"))
}
