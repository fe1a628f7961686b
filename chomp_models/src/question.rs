use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    MultiChoice,
    BinaryQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: i64,
    // Two options may share the same text; the id is the only safe handle.
    #[serde(rename = "option")]
    pub text: String,
    #[serde(default)]
    pub is_left: bool,
}

/// A question as fetched from the backend, immutable once received. A
/// present `deck_id` means the question belongs to a deck and answers go to
/// the deck endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub question: String,
    // The backend spells this field "durationMiliseconds"; kept as-is for
    // wire compatibility.
    #[serde(rename = "durationMiliseconds")]
    pub duration_ms: u64,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question_options: Vec<QuestionOption>,
    #[serde(default)]
    pub deck_id: Option<i64>,
}

impl Question {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn option(&self, id: i64) -> Option<&QuestionOption> {
        self.question_options.iter().find(|option| option.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_question_json() -> &'static str {
        r#"{
            "id": 42,
            "question": "Will it rain tomorrow?",
            "durationMiliseconds": 10000,
            "type": "BinaryQuestion",
            "deckId": 7,
            "questionOptions": [
                { "id": 1, "option": "Yes", "isLeft": true },
                { "id": 2, "option": "No", "isLeft": false }
            ]
        }"#
    }

    #[test]
    fn deserializes_backend_wire_format() {
        let question: Question = serde_json::from_str(backend_question_json()).unwrap();

        assert_eq!(question.id, 42);
        assert_eq!(question.kind, QuestionType::BinaryQuestion);
        assert_eq!(question.duration(), Duration::from_secs(10));
        assert_eq!(question.deck_id, Some(7));
        assert_eq!(question.question_options.len(), 2);
        assert_eq!(question.question_options[0].text, "Yes");
    }

    #[test]
    fn deck_id_defaults_to_none() {
        let question: Question = serde_json::from_str(
            r#"{
                "id": 1,
                "question": "Pick one",
                "durationMiliseconds": 5000,
                "type": "MultiChoice",
                "questionOptions": []
            }"#,
        )
        .unwrap();

        assert_eq!(question.deck_id, None);
    }

    #[test]
    fn options_are_looked_up_by_id_even_when_texts_collide() {
        let mut question: Question = serde_json::from_str(backend_question_json()).unwrap();
        question.question_options[1].text = "Yes".to_string();

        assert_eq!(question.option(2).map(|o| o.id), Some(2));
        assert_eq!(question.option(99), None);
    }
}
