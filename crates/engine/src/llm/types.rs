/// Outcome of a single LLM chat call — text plus basic token accounting.
#[derive(Clone, Debug)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
}

#[derive(Clone, Debug, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
