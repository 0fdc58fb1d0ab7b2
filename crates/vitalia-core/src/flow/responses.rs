//! Canned reply templates and LLM prompt builders.
//!
//! Every decision path has a template fallback, so a slow or failing
//! language model degrades the tone of a reply, never its availability.

use vitalia_types::recommend::ScoredCandidate;
use vitalia_types::session::ConversationSession;

pub const GREETING_FALLBACK: &str =
    "Hello! I can help you find supplements that fit your health goals. \
     What are you looking for today?";

pub const SMALLTALK_FALLBACK: &str =
    "Happy to help! Is there anything about your health goals I can look into?";

pub const WHICH_ONE: &str =
    "Which product do you mean? You can answer with its name or its number from the list.";

pub const GREETING_PROMPT: &str =
    "Greet the customer warmly in one or two sentences and invite them to \
     share their health goals.";

pub const SMALLTALK_PROMPT: &str =
    "Reply briefly and warmly, then steer the conversation back to the \
     customer's health goals.";

/// Ask the user to narrow down a vague query.
pub fn clarifying_question(topics: &[String]) -> String {
    match topics {
        [] => "Could you tell me a little more about what you're looking for? \
               For example sleep, immunity, digestion, or joint support."
            .to_string(),
        [topic] => format!(
            "Happy to help with {topic}. Is there anything specific, like a \
             symptom or a product you already have in mind?"
        ),
        many => format!(
            "I can help with {}. Which of these matters most right now?",
            many.join(" and ")
        ),
    }
}

/// Numbered candidate list used when the LLM cannot phrase the answer.
pub fn ranked_answer(candidates: &[ScoredCandidate]) -> String {
    if candidates.is_empty() {
        return "I couldn't find a good match for that. Could you tell me a \
                bit more about what you need?"
            .to_string();
    }
    let mut text = String::from("Here is what I would suggest:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, candidate.product_id));
    }
    text.push_str("Reply with a number if you would like to know more about one of them.");
    text
}

pub fn follow_up(complement: &str, product: &str) -> String {
    format!(
        "Since you picked {product}, many customers also take {complement} \
         alongside it. Would you like to hear more?"
    )
}

pub fn selection_ack(product: &str) -> String {
    format!("Great choice! {product} it is. Would you like dosage details or a purchase link?")
}

pub fn link_text(product: &str) -> String {
    format!(
        "Here is the order page for {product}: \
         https://shop.vitalia.example/products/{}",
        slug(product)
    )
}

pub fn consultation_offer() -> String {
    "If you'd like, one of our consultants can walk you through the order \
     and answer any questions."
        .to_string()
}

/// Instruction for phrasing a ranked answer, best candidate first.
pub fn answer_prompt(query: &str, candidates: &[ScoredCandidate]) -> String {
    let names: Vec<&str> = candidates.iter().map(|c| c.product_id.as_str()).collect();
    format!(
        "The customer asked: \"{query}\". Recommend these products in a \
         short, friendly reply, best match first: {}.",
        names.join(", ")
    )
}

/// Compact transcript of the most recent turns for LLM context.
pub fn history_digest(session: &ConversationSession) -> String {
    let recent: Vec<String> = session
        .turns
        .iter()
        .rev()
        .take(6)
        .map(|turn| format!("{}: {}", turn.speaker, turn.text))
        .collect();
    recent.into_iter().rev().collect::<Vec<_>>().join("\n")
}

fn slug(product: &str) -> String {
    product
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalia_types::recommend::{ScoreBreakdown, ScoredCandidate};
    use vitalia_types::session::Turn;

    fn candidate(id: &str) -> ScoredCandidate {
        ScoredCandidate {
            product_id: id.to_string(),
            score: 0.5,
            breakdown: ScoreBreakdown {
                relevance: 0.5,
                prior_discussion: 0.0,
                synergy: 0.0,
                stage: 0.0,
            },
        }
    }

    #[test]
    fn test_ranked_answer_numbers_candidates() {
        let text = ranked_answer(&[candidate("Vitamin C"), candidate("Zinc")]);
        assert!(text.contains("1. Vitamin C"));
        assert!(text.contains("2. Zinc"));
    }

    #[test]
    fn test_ranked_answer_empty() {
        let text = ranked_answer(&[]);
        assert!(text.contains("couldn't find"));
    }

    #[test]
    fn test_clarifying_question_variants() {
        assert!(clarifying_question(&[]).contains("tell me a little more"));
        assert!(clarifying_question(&["sleep".to_string()]).contains("sleep"));
        let both = clarifying_question(&["sleep".to_string(), "immunity".to_string()]);
        assert!(both.contains("sleep and immunity"));
    }

    #[test]
    fn test_link_text_slugifies() {
        let text = link_text("Magnesium Complex");
        assert!(text.contains("products/magnesium-complex"));
    }

    #[test]
    fn test_history_digest_recent_first_to_last() {
        let mut session = ConversationSession::empty("u1");
        session.push_turn(Turn::user("first", vec![]), 10);
        session.push_turn(Turn::assistant("second", vec![]), 10);
        let digest = history_digest(&session);
        assert_eq!(digest, "user: first\nassistant: second");
    }
}
