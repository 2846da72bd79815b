//! Prompts for the summarization request.
//!
//! Kept in one place so prompt changes never touch request or error-handling
//! code, and so tests can inspect the exact text sent to the model.

/// System message sent ahead of every summary request.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a precise technical summarizer. \
You read documents extracted from PDFs by OCR and describe them faithfully. \
Answer with the summary only, without preamble.";

/// Build the user message for a summary request around `content`.
pub fn summary_prompt(content: &str) -> String {
    format!(
        "Please provide a concise summary of the following document. \
Focus on the main topics, key points, and overall purpose of the document.\n\n\
Document content:\n{content}\n\n\
Please provide a summary:"
    )
}
