//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个系统的"指挥中心"，对外提供一个应用门面 `QuizApp`。
//!
//! ## 层次关系
//!
//! ```text
//! quiz_app (身份 + 开始答题 + 管理 + 统计)
//!     ↓
//! workflow::QuizFlow / FunQuiz (一次答题)
//!     ↓
//! services (能力层：selector / exam_gate / scoring / stats / repository / llm)
//!     ↓
//! infrastructure (基础设施：KvStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一写者**：只有 `QuizApp` 持有 `Repository`
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务计算**：评分、选题、准入都委托给能力层

pub mod quiz_app;

pub use quiz_app::QuizApp;
