use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // \w keeps digits: release years and metascores are searchable terms.
    static ref RE: Regex = Regex::new(r"(?u)\w+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOP_WORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
            "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
            "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
            "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
            "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
            "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
            "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
            "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
            "in", "out", "on", "off", "over", "under", "again", "further", "then", "once", "here",
            "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
            "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
            "than", "too", "very", "s", "t", "can", "will", "just", "don", "should", "now",
        ];
        words.iter().copied().collect()
    };
    // Domain words that carry no ranking signal in a query but are meaningful
    // in indexed text. Checked against stemmed tokens, hence the stemmed
    // variants alongside the surface forms.
    static ref QUERY_STOP_WORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i", "me", "my", "myself", "want", "to", "give", "would", "like", "provide",
            "provid", "show", "list", "find", "search", "game", "games", "title", "titles",
            "titl",
        ];
        words.iter().copied().collect()
    };
}

/// Normalize raw text into an ordered token sequence: NFKC, lowercase, word
/// extraction, stemming, then stop-word removal on the stemmed forms.
///
/// Duplicate occurrences are preserved; downstream term frequencies and
/// magnitudes depend on them. With `query_mode` set, the stricter query-only
/// stop-word set is applied as well.
pub fn normalize(text: &str, query_mode: bool) -> Vec<String> {
    let folded = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&folded) {
        let stem = STEMMER.stem(mat.as_str()).to_string();
        if STOP_WORDS.contains(stem.as_str()) {
            continue;
        }
        if query_mode && QUERY_STOP_WORDS.contains(stem.as_str()) {
            continue;
        }
        tokens.push(stem);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_and_lowercases() {
        let toks = normalize("Running, runner's run!", false);
        assert!(toks.iter().any(|w| w == "run"));
    }

    #[test]
    fn query_mode_is_stricter() {
        assert!(normalize("racing games", false).iter().any(|w| w == "game"));
        assert!(!normalize("racing games", true).iter().any(|w| w == "game"));
    }
}
