//! Prompts for the rewrite loop.

/// System prompt for the first, formal rewrite of extracted text.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an exceptional writer with expertise in crafting formal, informative, and engaging articles and papers. Your task is to refine and enhance the provided content, ensuring it is clear, well-structured, and compelling while maintaining a professional and authoritative tone. Improve coherence, depth, and readability, remove redundancies, vague statements, or filler content, and focus on delivering factually accurate and insightful writing.
Don't mention that you made changes. Just provide the refined article content.";

/// System prompt for instruction-driven rewrites. Uses `{instructions}` and
/// `{content}` placeholders.
pub const DEFAULT_INSTRUCTION_PROMPT: &str = "You are a refined writer tasked with updating the following content according to the extra instructions provided.

Extra Instructions: {instructions}

Update the content below accordingly. Do not mention that changes were made.

Content:
{content}";

/// Fill `{instructions}` and `{content}` in a template.
///
/// Substitution is a single pass, so placeholder text inside the substituted
/// values is left alone. Unknown `{...}` sequences are copied through.
pub fn render(template: &str, instructions: &str, content: &str) -> String {
    let mut out = String::with_capacity(template.len() + instructions.len() + content.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{instructions}") {
            out.push_str(instructions);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{content}") {
            out.push_str(content);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
