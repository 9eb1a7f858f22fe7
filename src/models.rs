//! Built-in model registry for tsuji.
//!
//! Static model lists for provider classes that expose no live listing
//! endpoint (Anthropic-compatible backends), plus metadata defaults applied
//! when a live listing returns ids we know nothing else about. The catalog
//! fetch layer is the only consumer.

/// Metadata for a known model.
pub struct ModelInfo {
    /// Native model identifier string (e.g. "claude-sonnet-4-6").
    pub name: &'static str,
    /// Human-readable display name.
    pub display_name: &'static str,
    /// Context window size in tokens.
    pub context_window: u32,
    /// Maximum output tokens per completion.
    pub max_output_tokens: u32,
}

/// Built-in list for Anthropic-compatible backends, which have no
/// `/models` listing endpoint.
pub const ANTHROPIC_MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "claude-opus-4-6",
        display_name: "Claude Opus 4.6",
        context_window: 200_000,
        max_output_tokens: 32_000,
    },
    ModelInfo {
        name: "claude-sonnet-4-6",
        display_name: "Claude Sonnet 4.6",
        context_window: 200_000,
        max_output_tokens: 64_000,
    },
    ModelInfo {
        name: "claude-haiku-4-5",
        display_name: "Claude Haiku 4.5",
        context_window: 200_000,
        max_output_tokens: 64_000,
    },
    ModelInfo {
        name: "claude-sonnet-4-5",
        display_name: "Claude Sonnet 4.5",
        context_window: 200_000,
        max_output_tokens: 64_000,
    },
];

/// Capability tags assumed for Anthropic-compatible backends.
pub const ANTHROPIC_CAPABILITIES: &[&str] = &["streaming", "tool-use"];

/// Capability tags assumed for OpenAI-compatible backends.
pub const OPENAI_COMPAT_CAPABILITIES: &[&str] = &["streaming", "tool-use", "json-mode"];

/// Looks up a built-in entry by native model name.
pub fn builtin(name: &str) -> Option<&'static ModelInfo> {
    ANTHROPIC_MODELS.iter().find(|m| m.name == name)
}
