//! Prompt and response-schema builders for each kind of lesson content

use crate::profile::Language;
use serde_json::{json, Value};

pub const QUIZ_QUESTION_COUNT: usize = 5;
pub const VOCABULARY_ITEM_COUNT: usize = 12;
pub const RACE_CHALLENGE_COUNT: usize = 15;
pub const STORY_WORD_COUNT: usize = 200;

/// A single structured-output request: prompt text plus the JSON shape asked for
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub prompt: String,
    pub schema: Value,
}

pub fn quiz_request(language: Language, topic: &str) -> ContentRequest {
    let prompt = format!(
        "Generate a {count}-question multiple choice quiz to learn {target}. The theme should be about {topic}.\n\
         Each question should have a 'question', 4 'options', a 'correctAnswer' (one of the options), \
         and a short 'explanation' in the user's native language ({native}).",
        count = QUIZ_QUESTION_COUNT,
        target = language.display_name(),
        native = language.native().display_name(),
    );

    ContentRequest {
        prompt,
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "question": { "type": "STRING" },
                    "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "correctAnswer": { "type": "STRING" },
                    "explanation": { "type": "STRING" }
                },
                "required": ["question", "options", "correctAnswer", "explanation"]
            }
        }),
    }
}

pub fn vocabulary_request(language: Language, topic: &str) -> ContentRequest {
    let prompt = format!(
        "Provide {count} vocabulary items related to {topic} for a language learner learning {target}.\n\
         Each item should have an 'id', 'name' (the word in {target}), 'translation' (the word in {native}), \
         and a relevant emoji.",
        count = VOCABULARY_ITEM_COUNT,
        target = language.display_name(),
        native = language.native().display_name(),
    );

    ContentRequest {
        prompt,
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "id": { "type": "STRING" },
                    "name": { "type": "STRING" },
                    "translation": { "type": "STRING" },
                    "emoji": { "type": "STRING" }
                },
                "required": ["id", "name", "translation", "emoji"]
            }
        }),
    }
}

pub fn story_request(language: Language, topic: &str) -> ContentRequest {
    let prompt = format!(
        "Write a short, engaging story or article (around {words} words) in {target} about {topic}.\n\
         Make it suitable for a language learner. Format as JSON with 'title' and 'content' fields.",
        words = STORY_WORD_COUNT,
        target = language.display_name(),
    );

    ContentRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "content": { "type": "STRING" }
            },
            "required": ["title", "content"]
        }),
    }
}

pub fn race_request(language: Language, topic: &str) -> ContentRequest {
    let prompt = format!(
        "Create {count} fast translation challenges for a learner of {target} themed around {topic}.\n\
         Each challenge has a 'prompt' (a short word or phrase in {native}), 'correct' (its accurate \
         translation into {target}) and 'wrong' (a plausible but incorrect {target} translation). \
         Keep every prompt under five words and order them from easiest to hardest.",
        count = RACE_CHALLENGE_COUNT,
        target = language.display_name(),
        native = language.native().display_name(),
    );

    ContentRequest {
        prompt,
        schema: json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "prompt": { "type": "STRING" },
                    "correct": { "type": "STRING" },
                    "wrong": { "type": "STRING" }
                },
                "required": ["prompt", "correct", "wrong"]
            }
        }),
    }
}

pub fn chat_system_instruction(language: Language, topic: &str) -> String {
    let target = language.display_name();
    format!(
        "You are a helpful and friendly language tutor. The user is learning {target}. \
         Keep the conversation interesting around the topics: {topic}. \
         If the user makes a mistake in {target}, gently correct them. \
         Respond in {target} mostly, but use brief translations if the concept is complex."
    )
}

/// Opening line of every tutor conversation
pub fn chat_greeting(language: Language, topic: &str) -> String {
    format!(
        "Hi! I'm your language partner. Let's talk about {topic} in {}. What's on your mind?",
        language.display_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_prompt_names_native_language() {
        let request = quiz_request(Language::English, "Cooking, Travel");
        assert!(request.prompt.contains("learn English"));
        assert!(request.prompt.contains("native language (Spanish)"));
        assert!(request.prompt.contains("Cooking, Travel"));
        assert_eq!(request.schema["type"], "ARRAY");
        assert_eq!(request.schema["items"]["required"][2], "correctAnswer");
    }

    #[test]
    fn vocabulary_prompt_translates_into_native_language() {
        let request = vocabulary_request(Language::Spanish, "Music");
        assert!(request.prompt.contains("learning Spanish"));
        assert!(request.prompt.contains("the word in English"));
    }

    #[test]
    fn story_schema_is_an_object() {
        let request = story_request(Language::Spanish, "Art and History");
        assert_eq!(request.schema["type"], "OBJECT");
        assert!(request.schema["properties"].get("content").is_some());
    }

    #[test]
    fn race_prompt_asks_for_prompt_correct_wrong() {
        let request = race_request(Language::English, "Formula 1");
        assert!(request.prompt.contains("Formula 1"));
        assert_eq!(
            request.schema["items"]["required"],
            json!(["prompt", "correct", "wrong"])
        );
    }

    #[test]
    fn chat_texts_mention_topic_and_language() {
        let instruction = chat_system_instruction(Language::Spanish, "Science");
        assert!(instruction.contains("learning Spanish"));
        assert!(instruction.contains("Science"));

        let greeting = chat_greeting(Language::English, "Sports");
        assert!(greeting.starts_with("Hi! I'm your language partner."));
        assert!(greeting.contains("Sports in English"));
    }
}
