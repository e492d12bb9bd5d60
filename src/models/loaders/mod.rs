pub mod toml_loader;

pub use toml_loader::{load_builtin_questions, load_question_bank, parse_question_bank};
