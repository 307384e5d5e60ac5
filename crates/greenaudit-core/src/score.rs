use std::sync::OnceLock;

use regex::Regex;

/// Neutral midpoint returned when no rule recovers a score from the reply.
/// Deliberately not 0, which would read as a failing audit.
pub const DEFAULT_SCORE: u8 = 50;

/// Characters inspected on each side of a bare number by the contextual scan.
pub const CONTEXT_WINDOW: usize = 20;

/// Which cascade rule produced the score. Used for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Labeled,
    FractionOf100,
    EcoLabel,
    Contextual,
    Default,
}

impl ScoreSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Labeled => "labeled",
            Self::FractionOf100 => "fraction_of_100",
            Self::EcoLabel => "eco_label",
            Self::Contextual => "contextual",
            Self::Default => "default",
        }
    }
}

/// Extract a sustainability score in 0..=100 from a free-form model reply.
///
/// The reply is produced by a generative service that was *asked* to begin
/// with a `Score: N/100` line, but nothing guarantees it did. An ordered
/// cascade of pattern rules runs until one yields an in-bounds number;
/// otherwise [`DEFAULT_SCORE`] is returned. Total: never fails, never
/// panics, and an empty reply is a normal case, not an error.
pub fn extract_score(text: &str) -> u8 {
    extract_score_with_source(text).0
}

/// Same cascade as [`extract_score`], also reporting which rule matched.
pub fn extract_score_with_source(text: &str) -> (u8, ScoreSource) {
    if text.is_empty() {
        return (DEFAULT_SCORE, ScoreSource::Default);
    }

    // Order is significant: an earlier rule's in-bounds match always wins.
    const RULES: [(fn(&str) -> Option<u8>, ScoreSource); 4] = [
        (labeled_score, ScoreSource::Labeled),
        (fraction_of_100, ScoreSource::FractionOf100),
        (eco_label, ScoreSource::EcoLabel),
        (contextual_number, ScoreSource::Contextual),
    ];

    for (rule, source) in RULES {
        if let Some(score) = rule(text) {
            return (score, source);
        }
    }
    (DEFAULT_SCORE, ScoreSource::Default)
}

/// Rule 1: "score: 85" / "score is 85". The expected common-case path when
/// the upstream prompt contract is honored.
fn labeled_score(text: &str) -> Option<u8> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)score[:\s]+(?:is\s+)?(\d{1,3})").expect("labeled score regex is valid")
    });
    bounded_capture(re, text)
}

/// Rule 2: "85/100" without a leading keyword.
fn fraction_of_100(text: &str) -> Option<u8> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"(?i)(\d{1,3})\s*/\s*100").expect("fraction regex is valid"));
    bounded_capture(re, text)
}

/// Rule 3: "eco-friendliness score: 85". Narrower fallback for replies
/// where the generic rule 1 phrasing fails to line up.
fn eco_label(text: &str) -> Option<u8> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)eco-friendliness\s+score[:\s]+(\d{1,3})")
            .expect("eco label regex is valid")
    });
    bounded_capture(re, text)
}

/// Rule 4, last resort: the first standalone 0-100 number with "score" or
/// "rating" inside a fixed window on either side. Numbers already rejected
/// by earlier rules stay eligible here.
fn contextual_number(text: &str) -> Option<u8> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re =
        RE.get_or_init(|| Regex::new(r"\b(\d{1,2}|100)\b").expect("bare number regex is valid"));

    let lowered = text.to_lowercase();
    for found in re.find_iter(&lowered) {
        let Some(value) = parse_bounded(found.as_str()) else {
            continue;
        };
        let before = window_before(&lowered, found.start(), CONTEXT_WINDOW);
        let after = window_after(&lowered, found.end(), CONTEXT_WINDOW);
        if before.contains("score")
            || after.contains("score")
            || before.contains("rating")
            || after.contains("rating")
        {
            return Some(value);
        }
    }
    None
}

fn bounded_capture(re: &Regex, text: &str) -> Option<u8> {
    let caps = re.captures(text)?;
    parse_bounded(caps.get(1)?.as_str())
}

/// An out-of-bounds or unparseable capture means the rule does not match;
/// the cascade continues instead of clamping.
fn parse_bounded(digits: &str) -> Option<u8> {
    let value: u16 = digits.parse().ok()?;
    if value <= 100 {
        Some(value as u8)
    } else {
        None
    }
}

fn window_before(text: &str, end: usize, width: usize) -> &str {
    let head = text.get(..end).unwrap_or("");
    let start = head
        .char_indices()
        .rev()
        .take(width)
        .last()
        .map_or(end, |(idx, _)| idx);
    text.get(start..end).unwrap_or("")
}

fn window_after(text: &str, start: usize, width: usize) -> &str {
    let tail = text.get(start..).unwrap_or("");
    match tail.char_indices().nth(width) {
        Some((idx, _)) => tail.get(..idx).unwrap_or(tail),
        None => tail,
    }
}
