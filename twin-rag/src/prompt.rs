//! Prompt builder: persona system message + context-grounded user message.

use llm_service::ChatMessage;

use crate::context::ContextBlock;

/// Default persona for the system message.
pub const DEFAULT_PERSONA: &str =
    "You are the digital twin of the user. Answer in first person and only use provided context.";

/// Two-role prompt sent to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// `[system, user]` chat messages.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Builds the prompt. Pure and deterministic.
///
/// The context block is embedded verbatim, followed by the literal question
/// and an instruction to admit missing information.
///
/// # Example
/// ```
/// use twin_rag::{ContextBlock, prompt::{build, DEFAULT_PERSONA}};
/// let ctx = ContextBlock::from_lines(vec!["Skills: Rust".into()]);
/// let p = build("What do you use?", &ctx, DEFAULT_PERSONA);
/// assert!(p.user.contains("Skills: Rust"));
/// assert!(p.user.contains("Question: What do you use?"));
/// ```
pub fn build(question: &str, context: &ContextBlock, persona: &str) -> Prompt {
    let user = format!(
        "Based on the information below from my profile, answer the question in first person.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         If the context does not contain enough detail, say you don't have enough information. \
         Keep the answer concise and professional.",
        context.render(),
        question.trim()
    );

    Prompt {
        system: persona.trim().to_string(),
        user,
    }
}
