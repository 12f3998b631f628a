use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes raw message text for keyword matching: trimmed, lowercased,
/// accents decomposed (NFD) with the combining marks dropped, so "não" and
/// "nao" compare equal.
///
/// Total and idempotent. Every keyword in the rule table is stored in this
/// canonical form, which is what lets plain substring containment stand in
/// for free-text understanding over a small keyword set.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}
