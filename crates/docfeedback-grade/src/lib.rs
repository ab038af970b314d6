//! Grading: rubric prompts, LLM feedback, section segmentation, and the
//! pipeline that ties the document service to the generator.
//!
//! One submission runs extract → read → generate → segment → patch and
//! ends in a `FeedbackReport`.

pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod rubric;
pub mod segment;
pub mod types;

pub use generator::{FeedbackGenerator, LlmFeedbackGenerator};
pub use pipeline::{FeedbackContext, PipelineSettings};
pub use prompt::PromptSpec;
pub use rubric::{Genre, GenreRubric, RubricCategory, GENRES};
pub use segment::segment_feedback;
pub use types::*;
