use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Grade, Question};

/// 一次答题的成绩记录，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: String,
    pub user_id: String,
    pub student_name: String,
    #[serde(default)]
    pub class_name: String,
    /// 0-10 分，保留一位小数
    pub score: f64,
    pub total_questions: usize,
    #[serde(default)]
    pub correct_count: usize,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Option<usize>>>,
}

impl QuizResult {
    /// 是否为正式考试成绩
    pub fn is_exam(&self) -> bool {
        label::is_exam(&self.label)
    }

    /// 标签的主题部分或题目中是否涉及某个主题（主题需完全一致）
    pub fn references_topic(&self, topic: &str) -> bool {
        label::topic(&self.label) == Some(topic)
            || self
                .questions
                .as_ref()
                .is_some_and(|qs| qs.iter().any(|q| q.has_topic(topic)))
    }
}

/// 成绩标签：编码模式 + 年级 + 状态
pub mod label {
    use super::Grade;

    const EXAM_PREFIX: &str = "exam";
    const AUTO_SUFFIX: &str = " (auto-submitted)";
    const TOPIC_SEPARATOR: &str = " · ";

    /// 正式考试标签，如 `exam grade 3`，超时自动交卷追加后缀
    pub fn exam(grade: Grade, auto_submitted: bool) -> String {
        let mut label = format!("{} grade {}", EXAM_PREFIX, grade);
        if auto_submitted {
            label.push_str(AUTO_SUFFIX);
        }
        label
    }

    /// 练习标签，如 `practice grade 2 · Bài tập thể dục`
    pub fn practice(grade: Option<Grade>, topic: Option<&str>) -> String {
        let mut label = String::from("practice");
        if let Some(grade) = grade {
            label.push_str(&format!(" grade {}", grade));
        }
        if let Some(topic) = topic {
            label.push_str(TOPIC_SEPARATOR);
            label.push_str(topic);
        }
        label
    }

    /// AI 生成题目练习的标签
    pub fn ai_practice(topic: &str) -> String {
        format!("ai practice{}{}", TOPIC_SEPARATOR, topic)
    }

    /// 标签中 ` · ` 之后的主题
    pub fn topic(label: &str) -> Option<&str> {
        label
            .split_once(TOPIC_SEPARATOR)
            .map(|(_, topic)| topic)
            .filter(|topic| !topic.is_empty())
    }

    pub fn is_exam(label: &str) -> bool {
        label.starts_with(EXAM_PREFIX)
    }

    /// 是否为指定年级的正式考试
    pub fn is_exam_for(label: &str, grade: Grade) -> bool {
        let prefix = format!("{} grade {}", EXAM_PREFIX, grade);
        match label.strip_prefix(&prefix) {
            Some(rest) => !rest.starts_with(|c: char| c.is_ascii_digit()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(n: u8) -> Grade {
        Grade::new(n).unwrap()
    }

    #[test]
    fn test_exam_labels() {
        assert_eq!(label::exam(grade(3), false), "exam grade 3");
        assert_eq!(label::exam(grade(3), true), "exam grade 3 (auto-submitted)");
        assert!(label::is_exam_for("exam grade 3 (auto-submitted)", grade(3)));
        assert!(!label::is_exam_for("exam grade 3", grade(2)));
        assert!(!label::is_exam_for("practice grade 3", grade(3)));
    }

    #[test]
    fn test_practice_labels() {
        assert_eq!(label::practice(Some(grade(2)), Some("Bài tập thể dục")), "practice grade 2 · Bài tập thể dục");
        assert_eq!(label::practice(None, None), "practice");
        assert!(!label::is_exam(&label::ai_practice("Bóng đá")));
        assert_eq!(label::topic("ai practice · Bóng đá"), Some("Bóng đá"));
        assert_eq!(label::topic("practice grade 2"), None);
    }

    #[test]
    fn test_topic_reference_matches_whole_topic() {
        let examinee = crate::models::Examinee {
            user_id: "u1".into(),
            student_name: "Lan".into(),
            class_name: "3A".into(),
        };
        let result = crate::services::scoring::build_result(
            &examinee,
            &[],
            &[],
            label::practice(Some(grade(3)), Some("Thể thao tự chọn")),
            chrono::Utc::now(),
        );
        assert!(result.references_topic("Thể thao tự chọn"));
        assert!(!result.references_topic("Thể thao"));
        assert!(!result.references_topic("practice"));
        assert!(!result.references_topic("grade 3"));
    }
}
