//! Extraction of generated text from heterogeneous completion payloads.

use serde_json::Value;

/// Shape of a decoded completion response.
///
/// OpenAI-compatible servers answer with `choices[0].message.content`;
/// Ollama-style chat servers put the text under `message.content`.
/// Anything else is kept as its JSON string so callers still get text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionShape {
    Choices(String),
    Message(String),
    Raw(String),
}

impl CompletionShape {
    /// Classifies a raw JSON completion.
    pub fn classify(value: &Value) -> Self {
        if let Some(text) = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        {
            return Self::Choices(text.to_string());
        }
        if let Some(text) = value.pointer("/message/content").and_then(Value::as_str) {
            return Self::Message(text.to_string());
        }
        match value {
            Value::String(s) => Self::Raw(s.clone()),
            other => Self::Raw(other.to_string()),
        }
    }

    /// Generated text with surrounding whitespace removed.
    pub fn into_text(self) -> String {
        match self {
            Self::Choices(s) | Self::Message(s) | Self::Raw(s) => s.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn openai_choices() {
        let v = json!({"choices": [{"message": {"role": "assistant", "content": "  I write Rust.\n"}}]});
        let shape = CompletionShape::classify(&v);
        assert!(matches!(shape, CompletionShape::Choices(_)));
        assert_eq!(shape.into_text(), "I write Rust.");
    }

    #[test]
    fn plain_message_mapping() {
        let v = json!({"model": "llama3", "message": {"content": "hello"}, "done": true});
        assert_eq!(
            CompletionShape::classify(&v),
            CompletionShape::Message("hello".into())
        );
    }

    #[test]
    fn unknown_shape_is_stringified() {
        let v = json!({"output": 42});
        assert_eq!(CompletionShape::classify(&v).into_text(), r#"{"output":42}"#);
    }

    #[test]
    fn null_content_falls_through() {
        let v = json!({"choices": [{"message": {"content": null}}]});
        assert!(matches!(CompletionShape::classify(&v), CompletionShape::Raw(_)));
    }

    #[test]
    fn null_body_is_stringified() {
        let shape = CompletionShape::classify(&Value::Null);
        assert_eq!(shape, CompletionShape::Raw("null".into()));
        assert_eq!(shape.into_text(), "null");
    }
}
