// Matching: evidence, point budget, scorers and the end-to-end pipeline.

pub mod budget;
pub mod evidence;
pub mod fingerprint;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scorer;
pub mod store;
