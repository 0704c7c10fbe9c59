//! Chatbot core: routing, the per-message pipeline and feedback handling.
//!
//! Nothing in here depends on teloxide's dispatcher; handlers in
//! `plugins::chatbot` convert updates and hand them over.

mod feedback;
mod message;
mod pipeline;

pub use feedback::{FeedbackAction, FeedbackQuery};
pub use message::{IncomingMessage, RoutedMessage, route};
pub use pipeline::{ChatPipeline, Outcome, PipelineOptions};
