// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every prompt that sees candidate data.
pub const FAIRNESS_INSTRUCTION: &str = "\
    CRITICAL: Judge only job-relevant qualifications. Never use or infer age, gender, \
    ethnicity, nationality, religion, marital status, disability, or photos. \
    Employment gaps are not negative evidence on their own.";

/// Instruction that keeps the model anchored to the resume text.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Every claim must be supported by the resume text provided. \
    Do NOT infer skills, employers, or degrees that are not written in the resume. \
    If a field is not present, use null (or an empty list) instead of guessing.";

/// Builds a full system prompt from a role description plus the JSON-only rules.
pub fn system_prompt(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}
