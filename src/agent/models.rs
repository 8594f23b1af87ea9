//! Request and response bodies for the OpenAI chat-completions API.

#[derive(serde::Serialize, Debug)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(serde::Serialize, Debug)]
pub struct ChatPayload<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
}

#[derive(serde::Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize, Debug)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(serde::Deserialize, Debug)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(serde::Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(serde::Deserialize, Debug)]
pub struct ApiErrorBody {
    pub message: String,
}
