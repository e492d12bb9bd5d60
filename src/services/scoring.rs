//! 计分
//!
//! 分数 = 答对数 / 总题数 × 10，保留一位小数

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::{Examinee, Question, QuizResult};
use crate::utils::new_id;

/// 计算 0-10 分，保留一位小数；总题数为 0 时得 0 分
pub fn compute_score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_one_decimal(correct as f64 / total as f64 * 10.0)
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 统计答对的题数，未作答不算对
pub fn count_correct(questions: &[Question], answers: &[Option<usize>]) -> usize {
    questions
        .iter()
        .enumerate()
        .filter(|(i, q)| q.is_correct(answers.get(*i).copied().flatten()))
        .count()
}

/// 成绩档次，仅用于展示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl GradeBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            GradeBand::Excellent
        } else if score >= 7.0 {
            GradeBand::Good
        } else {
            GradeBand::NeedsImprovement
        }
    }

    /// 界面文字
    pub fn caption(self) -> &'static str {
        match self {
            GradeBand::Excellent => "Xuất sắc",
            GradeBand::Good => "Khá",
            GradeBand::NeedsImprovement => "Cần cố gắng",
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeBand::Excellent => f.write_str("excellent"),
            GradeBand::Good => f.write_str("good"),
            GradeBand::NeedsImprovement => f.write_str("needs improvement"),
        }
    }
}

/// 根据题目和作答生成成绩记录；分母始终是分配的全部题数
pub fn build_result(
    examinee: &Examinee,
    questions: &[Question],
    answers: &[Option<usize>],
    label: String,
    now: DateTime<Utc>,
) -> QuizResult {
    let correct_count = count_correct(questions, answers);
    let total_questions = questions.len();

    QuizResult {
        id: new_id("r", now),
        user_id: examinee.user_id.clone(),
        student_name: examinee.student_name.clone(),
        class_name: examinee.class_name.clone(),
        score: compute_score(correct_count, total_questions),
        total_questions,
        correct_count,
        label,
        timestamp: now,
        questions: Some(questions.to_vec()),
        answers: Some(answers.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("q{}", i),
                    "?",
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    i % 4,
                )
            })
            .collect()
    }

    #[test]
    fn test_compute_score() {
        assert_eq!(compute_score(0, 15), 0.0);
        assert_eq!(compute_score(15, 15), 10.0);
        assert_eq!(compute_score(10, 15), 6.7);
        assert_eq!(compute_score(7, 10), 7.0);
        assert_eq!(compute_score(0, 0), 0.0);
    }

    #[test]
    fn test_count_correct_ignores_unanswered() {
        let qs = questions(4);
        let answers = vec![Some(0), None, Some(2), Some(0)];
        assert_eq!(count_correct(&qs, &answers), 2);
        assert_eq!(count_correct(&qs, &[]), 0);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(GradeBand::from_score(9.0), GradeBand::Excellent);
        assert_eq!(GradeBand::from_score(8.9), GradeBand::Good);
        assert_eq!(GradeBand::from_score(7.0), GradeBand::Good);
        assert_eq!(GradeBand::from_score(6.9), GradeBand::NeedsImprovement);
        assert_eq!(GradeBand::Good.to_string(), "good");
    }

    #[test]
    fn test_build_result_uses_full_denominator() {
        let examinee = Examinee {
            user_id: "hs1".into(),
            student_name: "Lan".into(),
            class_name: "2B".into(),
        };
        let qs = questions(15);
        let mut answers = vec![None; 15];
        for (i, slot) in answers.iter_mut().enumerate().take(5) {
            *slot = Some(i % 4);
        }
        let result = build_result(&examinee, &qs, &answers, "practice".into(), Utc::now());
        assert_eq!(result.correct_count, 5);
        assert_eq!(result.total_questions, 15);
        assert_eq!(result.score, 3.3);
        assert_eq!(result.student_name, "Lan");
        assert_eq!(result.answers.as_ref().map(Vec::len), Some(15));
    }
}
