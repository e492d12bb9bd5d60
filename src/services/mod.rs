pub mod exam_gate;
pub mod export;
pub mod llm_service;
pub mod repository;
pub mod scoring;
pub mod selector;
pub mod shuffle;
pub mod stats;

pub use exam_gate::ExamConfigs;
pub use llm_service::{GenerationRequest, LlmService, QuestionGenerator};
pub use repository::Repository;
pub use scoring::GradeBand;
pub use selector::QuestionFilter;
pub use stats::{ProgressPoint, TopicScore};
