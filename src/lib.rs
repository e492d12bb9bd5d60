//! # PE Quiz
//!
//! 小学体育知识测验：练习、限时考试、AI 出题和趣味小测验
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 键值存储，只暴露 get / set
//! - `FileStore` - 每个键一个 JSON 文件；`MemoryStore` - 测试用
//!
//! ### ② 业务能力层（Services）
//! - `selector` - 按年级/主题/难度逐级回退选题
//! - `exam_gate` - 考试时间窗口和单次作答限制
//! - `scoring` / `stats` - 评分和统计视图
//! - `repository` - 用户、成绩、题库、考试配置的唯一存取入口
//! - `LlmService` - AI 出题和评语
//!
//! ### ③ 流程层（Workflow）
//! - `QuizSession` - 答题状态机（NotStarted → Running → Finished）
//! - `Countdown` - 考试倒计时任务
//! - `QuizFlow` - 会话 + 倒计时
//! - `FunQuiz` - 趣味小测验
//!
//! ### ④ 编排层（Orchestration）
//! - `QuizApp` - 应用门面
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileStore, KvStore, MemoryStore};
pub use models::{Grade, Question, QuizResult};
pub use orchestrator::QuizApp;
pub use services::{LlmService, QuestionGenerator, Repository};
pub use workflow::{FunQuiz, QuizFlow, QuizMode, QuizSession};
