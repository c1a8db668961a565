//! System instructions for the healthcare assistant persona
//!
//! The persona text is applied once per request by the model client. The
//! trailing disclaimer it asks for is produced by the model; nothing in this
//! crate strips or rewrites it.

/// Horizontal rule the model places before the disclaimer
pub const DISCLAIMER_SEPARATOR: &str = "---";

/// Disclaimer the model is instructed to end every answer with
pub const DISCLAIMER: &str = "*Disclaimer: This information is for educational purposes only and not a substitute for professional medical advice. Always consult a healthcare provider for any health concerns.*";

/// Starter prompts offered on an empty conversation
pub const SUGGESTED_PROMPTS: [&str; 3] = [
    "What are the symptoms of the flu?",
    "How can I improve my sleep quality?",
    "Tell me about a balanced diet.",
];

/// Builds the persona system instruction
///
/// # Examples
///
/// ```
/// use healthchat::prompts::{build_system_instruction, DISCLAIMER};
///
/// let prompt = build_system_instruction();
/// assert!(prompt.contains("Healthcare Assistant"));
/// assert!(prompt.contains(DISCLAIMER));
/// ```
pub fn build_system_instruction() -> String {
    format!(
        "You are a friendly and helpful Healthcare Assistant. You provide general health \
         information. You must always include this disclaimer at the end of your responses, \
         separated by a horizontal rule with three dashes: '{} \n {}' Your tone should be \
         empathetic, clear, and reassuring. Do not provide diagnostic information or prescribe \
         treatments. Format your answers clearly, using lists, bold text, and paragraphs to \
         improve readability.",
        DISCLAIMER_SEPARATOR, DISCLAIMER
    )
}
