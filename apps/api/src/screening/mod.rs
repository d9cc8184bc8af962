// Candidate screening: structured profile extraction from resume text.
// All LLM calls go through llm_client; no direct Anthropic calls here.

pub mod candidate_parser;
pub mod contact;
pub mod handlers;
pub mod prompts;

pub use candidate_parser::extract_candidate;
