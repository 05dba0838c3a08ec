use icu_normalizer::ComposingNormalizerBorrowed;

/// Canonical form used when comparing answers: NFC (so precomposed and
/// combining Vietnamese diacritics compare equal), lowercase, trimmed, inner
/// whitespace collapsed to single spaces.
pub fn normalize(text: &str) -> String {
    let nfc = ComposingNormalizerBorrowed::new_nfc().normalize(text);
    nfc.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set-membership match: the candidate is correct when it equals any
/// accepted variant after normalization. Blank input never matches.
pub fn is_correct(candidate: &str, accepted: &[String]) -> bool {
    let candidate = normalize(candidate);
    if candidate.is_empty() {
        return false;
    }
    accepted.iter().any(|variant| normalize(variant) == candidate)
}
