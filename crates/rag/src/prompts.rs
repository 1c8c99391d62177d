//! Context rendering and the grounding instruction

use projectrag_vector::QueryMatch;

use crate::source::{UNKNOWN_OWNER, UNNAMED_PROJECT};

/// Reply the model must give when the context does not answer the question
pub const REFUSAL: &str =
    "I'm sorry, but I don't have enough information in the project database to answer that question.";

/// Line placed between rendered matches
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Render one match as a fixed-format paragraph
pub fn render_match(found: &QueryMatch) -> String {
    let metadata = &found.metadata;
    format!(
        "Project: {}\nOwner: {}\nDescription: {}\nRelevance Score: {:.4}",
        or_default(&metadata.project_name, UNNAMED_PROJECT),
        or_default(&metadata.owner, UNKNOWN_OWNER),
        metadata.description.trim(),
        found.score
    )
}

/// Render all matches; no matches gives an empty block
pub fn render_context(matches: &[QueryMatch]) -> String {
    matches
        .iter()
        .map(render_match)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// System instruction embedding `context` verbatim
pub fn system_prompt(context: &str) -> String {
    format!(
        r#"You are a helpful assistant for a project discovery platform. You answer questions about the projects listed in the context below.

<context>
{context}
</context>

Rules:
1. Answer ONLY using information found in the context above.
2. If the context does not contain the answer, respond exactly with: "{refusal}"
3. Do NOT use outside knowledge, even if you believe you know the answer.
4. Never make up or fabricate project names, owners, descriptions or any other details.
5. Format project details clearly: give each project's name, owner and a short description, using a list when more than one project is relevant."#,
        context = context,
        refusal = REFUSAL
    )
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
