//! Free-text sanitization and content check.
//!
//! [`TextSanitizer::validate`] cleans a user-supplied string and decides
//! whether it may be stored upstream. Structural checks (length, character
//! repetition) run on the whitespace-normalized text; the content check runs
//! on a separate, aggressively normalized copy that is never returned.
//!
//! Known blind spots: the filter is English-only, word-boundary based, and
//! the letter-spacing closer can merge innocent neighbouring words.

use std::fmt;

use thiserror::Error;

use super::catalog::{CatalogMatch, CompiledCatalog, ContentCategory, CATALOG};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length, in characters, of the whitespace-normalized text.
pub const MAX_LENGTH: usize = 100;

/// A character repeated this many times in a row is rejected.
pub const REPEAT_LIMIT: usize = 4;

/// Look-alike characters and the letter they stand for.
const SUBSTITUTIONS: &[(char, char)] = &[
    ('0', 'o'),
    ('1', 'i'),
    ('3', 'e'),
    ('4', 'a'),
    ('5', 's'),
    ('@', 'a'),
    ('$', 's'),
    ('!', 'i'),
    ('+', 't'),
    ('(', 'c'),
    (')', 'o'),
    ('[', 'c'),
    (']', 'o'),
    ('/', 'l'),
    ('\\', 'l'),
    ('|', 'l'),
    ('¡', 'i'),
    ('£', 'e'),
    ('¢', 'c'),
    ('¥', 'y'),
    ('€', 'e'),
];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which matching pass caught disallowed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    /// Matched against the match-normalized text as-is.
    Direct,
    /// Matched after joining all word tokens with no separator.
    Concatenated,
}

/// Why a piece of text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Normalized text is longer than [`MAX_LENGTH`] characters.
    #[error("must not exceed {} characters", MAX_LENGTH)]
    TooLong {
        /// Length of the normalized text, in characters.
        length: usize,
    },

    /// Some character repeats [`REPEAT_LIMIT`] or more times in a row.
    #[error("contains invalid character patterns")]
    RepeatedCharacters {
        /// The repeated character.
        character: char,
    },

    /// A catalog entry matched.
    #[error("contains inappropriate language")]
    InappropriateLanguage {
        /// Category of the first matching entry.
        category: ContentCategory,
        /// Pass that produced the match.
        pass: MatchPass,
    },
}

/// Outcome of a single validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Text may be stored; carries the whitespace-normalized value.
    Accepted(String),
    /// Text must not be stored.
    Rejected(Rejection),
}

impl Verdict {
    /// `true` for [`Verdict::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(r) => Some(r),
        }
    }

    /// Convert into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<String, Rejection> {
        match self {
            Verdict::Accepted(value) => Ok(value),
            Verdict::Rejected(r) => Err(r),
        }
    }
}

// ---------------------------------------------------------------------------
// TextSanitizer
// ---------------------------------------------------------------------------

/// Validates and cleans a single free-text field.
///
/// Holds only a reference to an immutable compiled catalog, so one instance
/// can be shared across every request without synchronization.
#[derive(Clone, Copy)]
pub struct TextSanitizer {
    catalog: &'static CompiledCatalog,
}

impl fmt::Debug for TextSanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSanitizer")
            .field("catalog_entries", &self.catalog.len())
            .finish()
    }
}

impl TextSanitizer {
    /// Sanitizer backed by the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(&CATALOG)
    }

    /// Sanitizer backed by a caller-supplied catalog.
    pub fn with_catalog(catalog: &'static CompiledCatalog) -> Self {
        Self { catalog }
    }

    /// Validate `raw`, coerced to text through its `Display` impl.
    ///
    /// Never panics. Rejection is a normal outcome, not an error.
    pub fn validate<T: fmt::Display + ?Sized>(&self, raw: &T) -> Verdict {
        let cleaned = normalize_whitespace(&raw.to_string());

        let length = cleaned.chars().count();
        if length > MAX_LENGTH {
            return Verdict::Rejected(Rejection::TooLong { length });
        }

        if let Some(character) = find_repeat_run(&cleaned, REPEAT_LIMIT) {
            return Verdict::Rejected(Rejection::RepeatedCharacters { character });
        }

        if let Some((hit, pass)) = self.check_content(&cleaned) {
            return Verdict::Rejected(Rejection::InappropriateLanguage {
                category: hit.category,
                pass,
            });
        }

        Verdict::Accepted(cleaned)
    }

    /// Run both content passes over a match-normalized copy of `text`.
    fn check_content(&self, text: &str) -> Option<(CatalogMatch, MatchPass)> {
        let normalized = normalize_for_match(text);

        if let Some(hit) = self.direct_pass(&normalized) {
            return Some((hit, MatchPass::Direct));
        }
        self.concatenated_pass(&normalized)
            .map(|hit| (hit, MatchPass::Concatenated))
    }

    /// First pass: the catalog against the normalized text.
    fn direct_pass(&self, normalized: &str) -> Option<CatalogMatch> {
        self.catalog.first_match(normalized)
    }

    /// Second pass: the catalog against all word tokens joined together.
    fn concatenated_pass(&self, normalized: &str) -> Option<CatalogMatch> {
        self.catalog.first_match(&concatenate_tokens(normalized))
    }
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Whether `c` separates words: Unicode whitespace plus the ASCII
/// information separators U+001C..=U+001F.
fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(input: &str) -> String {
    input
        .split(is_space)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the copy of `text` used only for catalog matching.
///
/// Lowercase, resolve look-alikes, collapse repeats, drop everything but
/// `[a-z0-9]` and whitespace, then close up letter-by-letter spacing.
pub fn normalize_for_match(text: &str) -> String {
    let substituted: String = text.to_lowercase().chars().map(substitute).collect();
    let collapsed = collapse_repeats(&substituted);
    let stripped: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_space(*c))
        .collect();
    close_letter_spacing(&stripped)
}

fn substitute(c: char) -> char {
    SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

/// Reduce each run of an identical character to one occurrence.
fn collapse_repeats(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev: Option<char> = None;
    for c in input.chars() {
        if prev != Some(c) {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Drop each whitespace run that follows a word character and precedes a
/// letter or digit.
fn close_letter_spacing(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !is_space(c) {
            out.push(c);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_space(chars[i]) {
            i += 1;
        }

        let after_word = start > 0 && chars[start - 1].is_ascii_alphanumeric();
        let before_word = i < chars.len() && chars[i].is_ascii_alphanumeric();
        if !(after_word && before_word) {
            out.extend(&chars[start..i]);
        }
    }

    out
}

/// Join every alphanumeric token with no separator.
fn concatenate_tokens(input: &str) -> String {
    input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Return the first character that repeats `limit` or more times in a row.
fn find_repeat_run(input: &str, limit: usize) -> Option<char> {
    let mut chars = input.chars();
    let mut prev = chars.next()?;
    let mut run: usize = 1;

    for ch in chars {
        if ch == prev {
            run += 1;
            if run >= limit {
                return Some(prev);
            }
        } else {
            prev = ch;
            run = 1;
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> TextSanitizer {
        TextSanitizer::new()
    }

    fn is_content_rejection(v: &Verdict) -> bool {
        matches!(
            v,
            Verdict::Rejected(Rejection::InappropriateLanguage { .. })
        )
    }

    // -- Whitespace normalization ------------------------------------------

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(normalize_whitespace("  a \t\n b  "), "a b");
    }

    #[test]
    fn test_information_separators_are_whitespace() {
        assert_eq!(normalize_whitespace("a\u{1f}b"), "a b");
        assert_eq!(
            sanitizer().validate("a\u{1f}b"),
            Verdict::Accepted("a b".to_string())
        );
        assert_eq!(
            sanitizer().validate("\u{1c}\u{1c}\u{1c}\u{1c}"),
            Verdict::Accepted(String::new())
        );
        assert_eq!(close_letter_spacing("ab\u{1d}cd"), "abcd");
    }

    #[test]
    fn test_whitespace_normalization_idempotent() {
        let once = normalize_whitespace(" Meter \u{a0} by\r\nthe   gate ");
        assert_eq!(normalize_whitespace(&once), once);
    }

    // -- Length ------------------------------------------------------------

    #[test]
    fn test_length_exactly_at_limit() {
        let input = "abcdefghij".repeat(10);
        assert_eq!(sanitizer().validate(&input), Verdict::Accepted(input.clone()));
    }

    #[test]
    fn test_length_over_limit() {
        let input = format!("{}k", "abcdefghij".repeat(10));
        assert_eq!(
            sanitizer().validate(&input),
            Verdict::Rejected(Rejection::TooLong { length: 101 })
        );
    }

    #[test]
    fn test_length_measured_after_trimming() {
        let input = format!("   {}   ", "abcdefghij".repeat(10));
        assert!(sanitizer().validate(&input).is_accepted());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let input = "éa".repeat(50);
        assert!(input.len() > MAX_LENGTH);
        assert!(sanitizer().validate(&input).is_accepted());
    }

    #[test]
    fn test_length_message_states_limit() {
        let msg = Rejection::TooLong { length: 120 }.to_string();
        assert!(msg.contains("100 characters"), "got: {}", msg);
    }

    // -- Repetition --------------------------------------------------------

    #[test]
    fn test_three_repeats_allowed() {
        assert_eq!(sanitizer().validate("aaa"), Verdict::Accepted("aaa".into()));
    }

    #[test]
    fn test_four_repeats_rejected() {
        assert_eq!(
            sanitizer().validate("aaaa"),
            Verdict::Rejected(Rejection::RepeatedCharacters { character: 'a' })
        );
    }

    #[test]
    fn test_repeat_of_punctuation_rejected() {
        let v = sanitizer().validate("gate code ????");
        assert!(matches!(
            v,
            Verdict::Rejected(Rejection::RepeatedCharacters { character: '?' })
        ));
    }

    #[test]
    fn test_repeat_check_runs_before_content() {
        let v = sanitizer().validate("fuuuuck");
        assert!(matches!(
            v,
            Verdict::Rejected(Rejection::RepeatedCharacters { .. })
        ));
    }

    #[test]
    fn test_repeat_check_is_case_sensitive() {
        // "aAaA" is not a run before case folding.
        assert!(find_repeat_run("aAaA", REPEAT_LIMIT).is_none());
    }

    #[test]
    fn test_collapsed_whitespace_is_not_a_run() {
        assert!(sanitizer().validate("a     b").is_accepted());
    }

    // -- Content: direct matches -------------------------------------------

    #[test]
    fn test_plain_profanity_rejected() {
        assert!(is_content_rejection(&sanitizer().validate("shit on the path")));
    }

    #[test]
    fn test_despacing_merges_words() {
        // Closing up spacing merges every word, so only a leading term keeps
        // its word boundary. Later terms are a known blind spot.
        assert_eq!(normalize_for_match("this is shit"), "thisisshit");
        assert!(sanitizer().validate("this is shit").is_accepted());
    }

    #[test]
    fn test_case_insensitive() {
        let lower = sanitizer().validate("fuck");
        let upper = sanitizer().validate("FUCK");
        assert!(is_content_rejection(&lower));
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_three_repeats_still_caught_by_content() {
        assert!(is_content_rejection(&sanitizer().validate("fuuuck")));
    }

    #[test]
    fn test_category_reported() {
        let v = sanitizer().validate("nazi");
        assert_eq!(
            v,
            Verdict::Rejected(Rejection::InappropriateLanguage {
                category: ContentCategory::HateReference,
                pass: MatchPass::Direct,
            })
        );
    }

    // -- Content: evasion --------------------------------------------------

    #[test]
    fn test_substitution_resistance() {
        assert!(is_content_rejection(&sanitizer().validate("sh1t")));
        assert!(is_content_rejection(&sanitizer().validate("$h!+")));
        assert!(is_content_rejection(&sanitizer().validate("b!tch")));
        assert!(is_content_rejection(&sanitizer().validate("p0rn")));
    }

    #[test]
    fn test_currency_lookalikes() {
        assert!(is_content_rejection(&sanitizer().validate("s€x")));
    }

    #[test]
    fn test_letter_spacing_resistance() {
        assert!(is_content_rejection(&sanitizer().validate("f u c k")));
        assert!(is_content_rejection(&sanitizer().validate("s h i t")));
    }

    #[test]
    fn test_token_splitting_resistance() {
        assert!(is_content_rejection(&sanitizer().validate("fu-ck")));
        assert!(is_content_rejection(&sanitizer().validate("sh.it")));
    }

    #[test]
    fn test_collapse_runs_before_despacing() {
        // Collapsing happens before spaced letters are closed up, so the
        // spaced form keeps its double letter while the plain word loses it.
        assert!(is_content_rejection(&sanitizer().validate("a s s")));
        assert!(sanitizer().validate("glass").is_accepted());
    }

    // -- Passes in isolation -----------------------------------------------

    #[test]
    fn test_concatenated_pass_joins_tokens() {
        let s = sanitizer();
        assert!(s.direct_pass("fu ck").is_none());
        let hit = s.concatenated_pass("fu ck").unwrap();
        assert_eq!(hit.category, ContentCategory::Profanity);
    }

    #[test]
    fn test_concatenate_tokens() {
        assert_eq!(concatenate_tokens(" ab cd  ef "), "abcdef");
        assert_eq!(concatenate_tokens(""), "");
    }

    // -- Match normalization -----------------------------------------------

    #[test]
    fn test_normalize_for_match_pipeline() {
        assert_eq!(normalize_for_match("FFuuuCK"), "fuck");
        assert_eq!(normalize_for_match("f u c k"), "fuck");
        assert_eq!(normalize_for_match("(|ean"), "clean");
    }

    #[test]
    fn test_close_letter_spacing_keeps_leading_space() {
        assert_eq!(close_letter_spacing(" ab cd "), " abcd ");
    }

    #[test]
    fn test_collapse_repeats() {
        assert_eq!(collapse_repeats("ffuuuck"), "fuck");
        assert_eq!(collapse_repeats("abc"), "abc");
    }

    // -- Acceptance --------------------------------------------------------

    #[test]
    fn test_clean_input_passes_through() {
        let v = sanitizer().validate("  Meter   behind the garage,\teast side ");
        assert_eq!(
            v,
            Verdict::Accepted("Meter behind the garage, east side".to_string())
        );
    }

    #[test]
    fn test_non_string_input_coerced() {
        assert_eq!(sanitizer().validate(&12345), Verdict::Accepted("12345".into()));
        assert_eq!(sanitizer().validate(&3.5), Verdict::Accepted("3.5".into()));
    }

    #[test]
    fn test_empty_input_accepted() {
        assert_eq!(sanitizer().validate(""), Verdict::Accepted(String::new()));
        assert_eq!(sanitizer().validate(" \t\n "), Verdict::Accepted(String::new()));
    }

    #[test]
    fn test_verdict_into_result() {
        assert_eq!(sanitizer().validate("ok").into_result(), Ok("ok".to_string()));
        assert!(sanitizer().validate("aaaa").into_result().is_err());
    }

    #[test]
    fn test_sanitizer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TextSanitizer>();
    }
}
