/// Business logic layer for thought-service
///
/// - Thought service: posts, comments and likes over a [`crate::db::ThoughtStore`]
/// - Validation: request checks that run before any store call
pub mod thoughts;
pub mod validation;

pub use thoughts::ThoughtService;
