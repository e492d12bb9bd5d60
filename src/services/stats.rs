//! 成绩统计视图
//!
//! 排行榜、进步曲线、主题雷达图，全部按需从成绩集合计算

use chrono::{DateTime, Utc};

use crate::models::{Principal, QuizResult};
use crate::services::scoring::round_one_decimal;

/// 排行榜人数
pub const RANKING_SIZE: usize = 10;
/// 进步曲线点数
pub const PROGRESS_POINTS: usize = 10;

/// 进步曲线上的一个点
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPoint {
    pub date: DateTime<Utc>,
    pub score: f64,
}

/// 雷达图上的一个主题
#[derive(Debug, Clone, PartialEq)]
pub struct TopicScore {
    pub topic: String,
    pub average: f64,
}

/// 正式考试成绩按分数降序取前 10
pub fn ranking(results: &[QuizResult]) -> Vec<&QuizResult> {
    let mut exams: Vec<&QuizResult> = results.iter().filter(|r| r.is_exam()).collect();
    exams.sort_by(|a, b| b.score.total_cmp(&a.score));
    exams.truncate(RANKING_SIZE);
    exams
}

/// 最近 10 次成绩，按时间先后排列
///
/// 特权用户看到所有人的成绩，其他人只看到自己的
pub fn progress_series(results: &[QuizResult], viewer: &Principal) -> Vec<ProgressPoint> {
    let mut visible: Vec<&QuizResult> = results
        .iter()
        .filter(|r| viewer.is_privileged() || r.user_id == viewer.user_id())
        .collect();
    visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    visible.truncate(PROGRESS_POINTS);
    visible.reverse();

    visible
        .into_iter()
        .map(|r| ProgressPoint {
            date: r.timestamp,
            score: r.score,
        })
        .collect()
}

/// 每个主题的平均分；没有相关成绩的主题为 0
pub fn topic_radar<S: AsRef<str>>(results: &[QuizResult], topics: &[S]) -> Vec<TopicScore> {
    topics
        .iter()
        .map(|topic| {
            let topic = topic.as_ref();
            let scores: Vec<f64> = results
                .iter()
                .filter(|r| r.references_topic(topic))
                .map(|r| r.score)
                .collect();
            let average = if scores.is_empty() {
                0.0
            } else {
                round_one_decimal(scores.iter().sum::<f64>() / scores.len() as f64)
            };
            TopicScore {
                topic: topic.to_string(),
                average,
            }
        })
        .collect()
}

/// 某个用户的全部成绩，最新的在前
pub fn user_history<'a>(results: &'a [QuizResult], user_id: &str) -> Vec<&'a QuizResult> {
    let mut history: Vec<&QuizResult> = results.iter().filter(|r| r.user_id == user_id).collect();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, Role, User};
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 7, 30, 0).unwrap()
    }

    fn result(user_id: &str, score: f64, label: &str, minutes: i64) -> QuizResult {
        QuizResult {
            id: format!("r{}", minutes),
            user_id: user_id.into(),
            student_name: user_id.into(),
            class_name: "3A".into(),
            score,
            total_questions: 10,
            correct_count: 0,
            label: label.into(),
            timestamp: base_time() + Duration::minutes(minutes),
            questions: None,
            answers: None,
        }
    }

    fn student(id: &str) -> Principal {
        Principal::User(User {
            id: id.into(),
            name: id.into(),
            username: id.into(),
            password: "x".into(),
            class_name: None,
            grade: None,
            role: Role::Student,
        })
    }

    #[test]
    fn test_ranking_only_exams_sorted_desc() {
        let results = vec![
            result("a", 9.5, "exam grade 3", 1),
            result("b", 7.0, "exam grade 3", 2),
            result("c", 8.0, "practice", 3),
        ];
        let scores: Vec<f64> = ranking(&results).iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![9.5, 7.0]);
    }

    #[test]
    fn test_ranking_top_ten() {
        let results: Vec<QuizResult> = (0..15)
            .map(|i| result("a", i as f64 / 2.0, "exam grade 1", i))
            .collect();
        let ranked = ranking(&results);
        assert_eq!(ranked.len(), RANKING_SIZE);
        assert_eq!(ranked[0].score, 7.0);
    }

    #[test]
    fn test_progress_series_last_ten_chronological() {
        // 成绩集合最新的在前
        let mut results: Vec<QuizResult> = (0..12)
            .map(|i| result("me", i as f64, "practice", i))
            .collect();
        results.push(result("other", 10.0, "practice", 100));
        results.reverse();

        let series = progress_series(&results, &student("me"));
        let scores: Vec<f64> = series.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));

        let all = progress_series(&results, &Principal::Admin);
        assert_eq!(all.last().map(|p| p.score), Some(10.0));
    }

    #[test]
    fn test_topic_radar() {
        let mut with_questions = result("a", 6.0, "exam grade 2", 1);
        with_questions.questions = Some(vec![Question::new("q", "?", vec![], 0).with_topic("Bơi")]);
        let results = vec![
            with_questions,
            result("b", 9.0, "practice grade 2 · Bơi", 2),
            result("c", 3.0, "practice grade 2 · Chạy", 3),
        ];

        let radar = topic_radar(&results, &["Bơi", "Chạy", "Nhảy"]);
        assert_eq!(radar[0], TopicScore { topic: "Bơi".into(), average: 7.5 });
        assert_eq!(radar[1].average, 3.0);
        assert_eq!(radar[2].average, 0.0);
    }

    #[test]
    fn test_user_history_newest_first() {
        let results = vec![result("a", 1.0, "practice", 1), result("a", 2.0, "practice", 5), result("b", 3.0, "practice", 3)];
        let history: Vec<f64> = user_history(&results, "a").iter().map(|r| r.score).collect();
        assert_eq!(history, vec![2.0, 1.0]);
    }
}
