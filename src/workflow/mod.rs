pub mod countdown;
pub mod fun_quiz;
pub mod quiz_flow;
pub mod session;

pub use countdown::{Countdown, SharedSession};
pub use fun_quiz::{FunQuiz, FunStage};
pub use quiz_flow::QuizFlow;
pub use session::{Advance, QuizMode, QuizSession, SessionState, Tick};
