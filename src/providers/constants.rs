//! Constants for provider interactions
//!
//! This module centralizes the prompt text, JSON field names, paths and the
//! fixed user-facing messages used across the service so they are defined
//! exactly once.

/// Prompt text sent to the provider
pub mod prompts {
    /// Persona for every analysis request
    pub const SYSTEM: &str = "You are a brand perception analyst. You study how companies are \
        perceived by customers, press and the wider market, and you answer only with well-formed JSON.";

    /// Instruction for a single domain
    pub fn user(domain: &str) -> String {
        format!(
            "Analyze how the brand behind the domain \"{domain}\" is perceived online.\n\
             Respond with a JSON object containing exactly these fields:\n\
             - \"summary\": a 2-3 sentence summary of the overall brand perception\n\
             - \"adjectives\": an array of 5-8 adjectives that dominate how people describe the brand\n\
             - \"competitors\": an array of 3-5 domains of the brand's closest perceived competitors\n\
             Return only the JSON object."
        )
    }
}

/// JSON field names used by chat-completion style APIs
pub mod json_fields {
    pub const ROLE_SYSTEM: &str = "system";
    pub const ROLE_USER: &str = "user";
    pub const RESPONSE_FORMAT_JSON_OBJECT: &str = "json_object";
}

/// Path constants for routing and URL manipulation
pub mod paths {
    pub const CHAT_COMPLETIONS: &str = "/chat/completions";
    pub const ANALYZE: &str = "/api/analyze";
    pub const HEALTH: &str = "/health";
}

/// Configuration defaults
pub mod defaults {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    pub const MODEL: &str = "gpt-4o-mini";
}

/// Messages returned to callers of the analysis endpoint
pub mod error_messages {
    pub const DOMAIN_REQUIRED: &str = "Domain is required";
    pub const INVALID_DOMAIN_FORMAT: &str = "Invalid domain format";
    pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
    pub const REQUEST_TOO_LARGE: &str = "Request body too large";
    pub const API_KEY_NOT_CONFIGURED: &str = "OpenAI API key not configured";
    pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format from OpenAI";
    pub const PROVIDER_TIMEOUT: &str = "OpenAI request timed out";
    pub const UNEXPECTED: &str = "An unexpected error occurred";
}
