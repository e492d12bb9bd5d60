use crate::models::question::Question;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 内置题库
const BUILTIN_BANK: &str = include_str!("../../../assets/question_bank.toml");

#[derive(Debug, Deserialize)]
struct QuestionBankFile {
    #[serde(default)]
    questions: Vec<Question>,
}

/// 解析 TOML 题库文本，丢弃不合法的题目
pub fn parse_question_bank(content: &str) -> Result<Vec<Question>> {
    let bank: QuestionBankFile = toml::from_str(content).context("无法解析题库TOML")?;

    let total = bank.questions.len();
    let questions: Vec<Question> = bank
        .questions
        .into_iter()
        .filter(|q| match q.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("跳过不合法的题目 {}: {}", q.id, e);
                false
            }
        })
        .collect();

    if questions.len() < total {
        tracing::warn!("题库中有 {} 道题被丢弃", total - questions.len());
    }

    Ok(questions)
}

/// 加载编译进程序的内置题库
pub fn load_builtin_questions() -> Result<Vec<Question>> {
    parse_question_bank(BUILTIN_BANK).context("内置题库损坏")
}

/// 从 TOML 文件加载题库
pub async fn load_question_bank(toml_file_path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取题库文件: {}", toml_file_path.display()))?;

    let questions = parse_question_bank(&content)
        .with_context(|| format!("无法解析题库文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载 {} 个题目: {}",
        questions.len(),
        toml_file_path.display()
    );

    Ok(questions)
}
