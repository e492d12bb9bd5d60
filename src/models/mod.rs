pub mod exam;
pub mod fun;
pub mod grade;
pub mod loaders;
pub mod question;
pub mod result;
pub mod user;

pub use exam::{ExamStatus, GradeConfig};
pub use fun::{FunQuestion, FunQuestionKind, FunTaskResult};
pub use grade::Grade;
pub use loaders::{load_builtin_questions, load_question_bank};
pub use question::{Difficulty, Question, KNOWN_TOPICS, OPTION_COUNT};
pub use result::QuizResult;
pub use user::{Examinee, Principal, Registration, Role, User, ADMIN_USERNAME};
