//! Prompt assembly for the downstream narrative generator.
//!
//! Pure string formatting: joins the retriever's reasoning lines into a
//! context block inside a fixed clinical decision-support instruction
//! template. The generator's reply is opaque to this crate.

/// Format the grounding prompt handed to the external generator.
///
/// Always succeeds; empty `reasoning` produces an empty context block.
pub fn format_prompt(query: &str, reasoning: &[String]) -> String {
    let context = reasoning.join("\n");
    format!(
        "You are a clinical decision support AI. Use the following Knowledge Graph context \
         to answer the user's query.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Query: {query}\n\
         \n\
         Provide a concise clinical explanation and recommendation based on the context provided."
    )
}
