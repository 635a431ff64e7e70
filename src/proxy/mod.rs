//! Outbound calls to the text-generation backends.

mod gemini;

pub use gemini::{GenerationClient, GenerationParams, ModelCandidate};
