use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::Grade;

/// 题库中题目的选项数量
pub const OPTION_COUNT: usize = 4;

/// 体育课的知识主题
pub const KNOWN_TOPICS: [&str; 5] = [
    "Đội hình đội ngũ",
    "Bài tập thể dục",
    "Tư thế và kỹ năng vận động cơ bản",
    "Thể thao tự chọn",
    "Vệ sinh và an toàn",
];

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// 选择题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
}

impl Question {
    /// 创建不带标签的题目
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options,
            correct_index,
            grade: None,
            topic: None,
            difficulty: None,
            lesson: None,
        }
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// 正确选项的文本
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    /// 判断作答是否正确，未作答永远不算对
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_index)
    }

    /// 校验题库录入的题目：题干非空、4 个非空选项、正确答案索引有效
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "text" });
        }
        if self.options.len() != OPTION_COUNT {
            return Err(ValidationError::OptionCount {
                expected: OPTION_COUNT,
                actual: self.options.len(),
            });
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(ValidationError::EmptyField { field: "options" });
        }
        if self.correct_index >= self.options.len() {
            return Err(ValidationError::CorrectIndexOutOfRange {
                index: self.correct_index,
                max_index: self.options.len() - 1,
            });
        }
        Ok(())
    }

    /// 题目是否属于某个主题
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topic.as_deref() == Some(topic)
    }
}
