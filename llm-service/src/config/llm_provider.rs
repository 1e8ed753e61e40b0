/// Backend used for chat completions or embeddings.
///
/// `OpenAI` covers every server that speaks the OpenAI chat-completions
/// protocol, which is how Groq is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local or remote Ollama runtime.
    Ollama,
    /// OpenAI-compatible API (Groq, OpenAI, vLLM, ...).
    OpenAI,
}

impl LlmProvider {
    /// Parses a provider name as used in `LLM_PROVIDER`.
    ///
    /// `groq`, `openai` and `chatgpt` all map to [`LlmProvider::OpenAI`].
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "groq" | "openai" | "chatgpt" => Some(Self::OpenAI),
            _ => None,
        }
    }
}
