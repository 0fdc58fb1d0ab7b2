//! Rule-based intent matching over normalized message text.
//!
//! Rules are checked in a fixed order and the first match wins, so the
//! more specific intents (synergy, link, selection) shadow the generic
//! product-query fallback. All matching is case-insensitive and
//! word-boundary aware; "it" matches the word, never the "it" in
//! "vitamin".

use vitalia_types::context::Intent;

const GREETING_PHRASES: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "greetings",
];

const SMALLTALK_PHRASES: &[&str] = &[
    "how are you",
    "thanks",
    "thank you",
    "ok",
    "okay",
    "cool",
    "great",
    "nice",
    "bye",
    "goodbye",
    "see you",
];

const LINK_PHRASES: &[&str] = &[
    "link",
    "where can i buy",
    "where to buy",
    "where do i buy",
    "how do i order",
    "how can i order",
    "purchase",
    "send me the link",
    "buy it",
    "order it",
];

const SYNERGY_PHRASES: &[&str] = &[
    "goes well with",
    "go well with",
    "goes with",
    "pairs with",
    "pair with",
    "combine with",
    "combines with",
    "combined with",
    "together with",
    "take together",
    "take with",
    "stack with",
    "complement",
];

const REFERENTIAL_PHRASES: &[&str] = &[
    "it",
    "that",
    "this",
    "that one",
    "this one",
    "the same",
    "similar",
    "something like that",
    "the one you mentioned",
];

const AMBIGUOUS_PHRASES: &[&str] = &[
    "something for health",
    "something healthy",
    "i need something",
    "recommend something",
    "suggest something",
    "what do you have",
    "what should i take",
    "any recommendations",
    "help me choose",
];

const PURCHASE_PHRASES: &[&str] = &[
    "buy",
    "order",
    "purchase",
    "price",
    "cost",
    "how much",
    "in stock",
    "available",
    "checkout",
    "cart",
];

const ORDINAL_WORDS: &[(&str, usize)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
];

/// Health focus areas and the message keywords that indicate them.
pub const HEALTH_TOPICS: &[(&str, &[&str])] = &[
    ("liver", &["liver", "detox", "hepatic"]),
    (
        "immunity",
        &["immunity", "immune", "cold", "flu", "winter", "defenses"],
    ),
    (
        "heart",
        &["heart", "cardiovascular", "cholesterol", "blood pressure"],
    ),
    ("bones", &["bones", "bone", "joints", "joint", "cartilage"]),
    ("sleep", &["sleep", "insomnia", "relax", "calm", "stress"]),
    (
        "digestion",
        &["digestion", "digestive", "gut", "stomach", "bloating"],
    ),
];

/// Lowercase the text and turn punctuation into spaces, collapsing runs.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_space = true;
    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    let padded = format!(" {normalized} ");
    padded.contains(&format!(" {phrase} "))
}

fn contains_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(normalized, p))
}

fn word_count(normalized: &str) -> usize {
    normalized.split_whitespace().count()
}

/// Classify a raw user message into an intent.
pub fn classify(text: &str) -> Intent {
    let normalized = normalize(text);
    let words = word_count(&normalized);

    // Short social messages only; "hi, does magnesium help sleep" is a query
    if words <= 3 && contains_any(&normalized, GREETING_PHRASES) {
        return Intent::Greeting;
    }
    if words <= 3 && contains_any(&normalized, SMALLTALK_PHRASES) {
        return Intent::Smalltalk;
    }
    if contains_any(&normalized, SYNERGY_PHRASES) {
        return Intent::SynergyRequest;
    }
    if contains_any(&normalized, LINK_PHRASES) {
        return Intent::LinkRequest;
    }
    if ordinal_of(&normalized).is_some() {
        return Intent::Selection;
    }
    if words <= 6 && contains_any(&normalized, REFERENTIAL_PHRASES) {
        return Intent::Clarification;
    }
    Intent::ProductQuery
}

/// Extract a 1-based ordinal from a short selection message.
///
/// Accepts bare digits ("2"), ordinal words ("the second one"), and
/// selector framing ("option 3", "number 1"). Longer sentences are never
/// treated as selections even if they contain a digit.
pub fn ordinal_of(normalized: &str) -> Option<usize> {
    let meaningful: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| !matches!(*w, "the" | "option" | "number" | "one" | "please"))
        .collect();
    if meaningful.len() > 4 || meaningful.is_empty() {
        return None;
    }
    for word in &meaningful {
        if let Ok(n) = word.parse::<usize>() {
            if (1..=9).contains(&n) {
                return Some(n);
            }
            return None;
        }
        for (name, n) in ORDINAL_WORDS {
            if word == name {
                return Some(*n);
            }
        }
    }
    None
}

/// Number of distinct purchase-signal phrases present in the message.
pub fn purchase_signal_count(text: &str) -> usize {
    let normalized = normalize(text);
    PURCHASE_PHRASES
        .iter()
        .filter(|p| contains_phrase(&normalized, p))
        .count()
}

/// Health focus areas whose keywords appear in the message.
pub fn detect_topics(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    HEALTH_TOPICS
        .iter()
        .filter(|(_, keywords)| contains_any(&normalized, keywords))
        .map(|(topic, _)| (*topic).to_string())
        .collect()
}

/// Whether the message points back at something said earlier.
pub fn has_referential(text: &str) -> bool {
    contains_any(&normalize(text), REFERENTIAL_PHRASES)
}

/// Whether a product query is too vague to search on.
pub fn is_ambiguous(text: &str) -> bool {
    contains_any(&normalize(text), AMBIGUOUS_PHRASES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Hi!  How's it going?"), "hi how s it going");
        assert_eq!(normalize("...ok..."), "ok");
    }

    #[test]
    fn test_greeting_only_when_short() {
        assert_eq!(classify("Hi!"), Intent::Greeting);
        assert_eq!(classify("hey there"), Intent::Greeting);
        assert_eq!(
            classify("hi, which supplements help with sleep problems"),
            Intent::ProductQuery
        );
    }

    #[test]
    fn test_smalltalk() {
        assert_eq!(classify("thanks!"), Intent::Smalltalk);
        assert_eq!(classify("ok cool"), Intent::Smalltalk);
    }

    #[test]
    fn test_synergy_beats_link() {
        assert_eq!(classify("what goes well with that?"), Intent::SynergyRequest);
        assert_eq!(
            classify("can i take magnesium together with calcium"),
            Intent::SynergyRequest
        );
    }

    #[test]
    fn test_link_request() {
        assert_eq!(classify("send me the link"), Intent::LinkRequest);
        assert_eq!(classify("where can i buy it?"), Intent::LinkRequest);
    }

    #[test]
    fn test_selection_ordinals() {
        assert_eq!(classify("1"), Intent::Selection);
        assert_eq!(classify("the second one"), Intent::Selection);
        assert_eq!(classify("option 3 please"), Intent::Selection);
        // A digit inside a long sentence is not a selection
        assert_eq!(
            classify("i read that 2 capsules a day of magnesium is the usual dose"),
            Intent::ProductQuery
        );
    }

    #[test]
    fn test_ordinal_of_values() {
        assert_eq!(ordinal_of("2"), Some(2));
        assert_eq!(ordinal_of("the third one"), Some(3));
        assert_eq!(ordinal_of("number 1"), Some(1));
        assert_eq!(ordinal_of("42"), None);
        assert_eq!(ordinal_of("tell me more"), None);
    }

    #[test]
    fn test_referential_clarification() {
        assert_eq!(classify("tell me more about it"), Intent::Clarification);
        assert_eq!(classify("is that one good?"), Intent::Clarification);
        // Long referential sentences fall through to product query
        assert_eq!(
            classify("i wonder whether that supplement would interact with the medication i take daily"),
            Intent::ProductQuery
        );
    }

    #[test]
    fn test_product_query_fallback() {
        assert_eq!(
            classify("which supplements support immunity in winter"),
            Intent::ProductQuery
        );
    }

    #[test]
    fn test_word_boundaries() {
        // "it" inside "vitamin" must not count as referential
        assert!(!has_referential("vitamin c dosage"));
        assert!(has_referential("how much of it should i take"));
    }

    #[test]
    fn test_purchase_signals() {
        assert_eq!(purchase_signal_count("how much does it cost"), 2);
        assert_eq!(purchase_signal_count("tell me about magnesium"), 0);
    }

    #[test]
    fn test_detect_topics() {
        let topics = detect_topics("something for immunity and better sleep in winter");
        assert_eq!(topics, vec!["immunity".to_string(), "sleep".to_string()]);
        assert!(detect_topics("hello there").is_empty());
    }

    #[test]
    fn test_is_ambiguous() {
        assert!(is_ambiguous("I need something for health"));
        assert!(is_ambiguous("recommend something please"));
        assert!(!is_ambiguous("which magnesium supplement helps with sleep"));
    }
}
