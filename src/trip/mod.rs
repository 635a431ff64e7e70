//! Trip domain: request shapes, validation and prompt rendering.

pub mod models;
pub mod prompt;
pub mod validate;

pub use models::{GenerationRequest, GenerationResult, NewTrip, Trip, TripRequestBody};
pub use prompt::build_prompt;
pub use validate::{parse_body, validate};
