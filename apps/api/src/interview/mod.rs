// Interview question generation for a finished match.
// All LLM calls go through llm_client; templates cover model failures.

pub mod handlers;
pub mod prompts;
pub mod questions;
