//! 题目池选择
//!
//! 按 年级/主题/难度 逐级放宽过滤条件，直到得到非空题目池，再随机抽取固定数量

use rand::Rng;
use tracing::debug;

use crate::models::{Difficulty, Grade, Question};
use crate::services::shuffle::{shuffle_options_with, shuffle_with};

/// 开放练习抽题数量
pub const PRACTICE_QUESTION_COUNT: usize = 15;
/// 正式考试抽题数量
pub const EXAM_QUESTION_COUNT: usize = 10;

/// 抽题条件，None 表示不限
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub grade: Option<Grade>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
}

impl QuestionFilter {
    fn grade_matches(&self, q: &Question) -> bool {
        self.grade.is_none() || q.grade == self.grade
    }

    fn topic_matches(&self, q: &Question) -> bool {
        match &self.topic {
            Some(topic) => q.has_topic(topic),
            None => true,
        }
    }

    /// 未标注难度的题目视为匹配任意难度
    fn difficulty_matches(&self, q: &Question) -> bool {
        match (self.difficulty, q.difficulty) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

type Tier = fn(&QuestionFilter, &Question) -> bool;

fn grade_topic_difficulty(f: &QuestionFilter, q: &Question) -> bool {
    f.grade_matches(q) && f.topic_matches(q) && f.difficulty_matches(q)
}

fn grade_topic(f: &QuestionFilter, q: &Question) -> bool {
    f.grade_matches(q) && f.topic_matches(q)
}

fn grade_only(f: &QuestionFilter, q: &Question) -> bool {
    f.grade_matches(q)
}

fn everything(_: &QuestionFilter, _: &Question) -> bool {
    true
}

/// 逐级放宽的过滤条件，顺序即优先级
const FALLBACK_TIERS: [(&str, Tier); 4] = [
    ("年级+主题+难度", grade_topic_difficulty),
    ("年级+主题", grade_topic),
    ("年级", grade_only),
    ("全部", everything),
];

/// 返回第一个非空的题目池；只有题库本身为空时才返回空
pub fn select_pool<'a>(filter: &QuestionFilter, questions: &'a [Question]) -> Vec<&'a Question> {
    for (name, tier) in FALLBACK_TIERS {
        let pool: Vec<&Question> = questions.iter().filter(|q| tier(filter, q)).collect();
        if !pool.is_empty() {
            debug!("题目池命中 [{}]，共 {} 题", name, pool.len());
            return pool;
        }
    }
    Vec::new()
}

/// 练习抽题：内置题库 ∪ 自建题库，最多 15 题，选项各自打乱
pub fn pick_practice(
    filter: &QuestionFilter,
    builtin: &[Question],
    authored: &[Question],
) -> Vec<Question> {
    pick_practice_with(filter, builtin, authored, &mut rand::thread_rng())
}

pub fn pick_practice_with<R: Rng + ?Sized>(
    filter: &QuestionFilter,
    builtin: &[Question],
    authored: &[Question],
    rng: &mut R,
) -> Vec<Question> {
    let combined: Vec<Question> = builtin.iter().chain(authored).cloned().collect();
    let pool: Vec<Question> = select_pool(filter, &combined).into_iter().cloned().collect();

    sample(&pool, PRACTICE_QUESTION_COUNT, rng)
}

/// 考试抽题：优先该年级的自建题目，不足 10 题时用内置题库补齐
pub fn pick_exam(grade: Grade, builtin: &[Question], authored: &[Question]) -> Vec<Question> {
    pick_exam_with(grade, builtin, authored, &mut rand::thread_rng())
}

pub fn pick_exam_with<R: Rng + ?Sized>(
    grade: Grade,
    builtin: &[Question],
    authored: &[Question],
    rng: &mut R,
) -> Vec<Question> {
    let in_grade = |q: &&Question| q.grade == Some(grade);

    let authored_pool: Vec<Question> = authored.iter().filter(in_grade).cloned().collect();
    let mut pool = shuffle_with(&authored_pool, rng);

    if pool.len() < EXAM_QUESTION_COUNT {
        debug!(
            "{} 年级自建题目只有 {} 道，使用内置题库补齐",
            grade,
            pool.len()
        );
        let builtin_same_grade: Vec<Question> = builtin.iter().filter(in_grade).cloned().collect();
        let builtin_other: Vec<Question> = builtin
            .iter()
            .filter(|q| q.grade != Some(grade))
            .cloned()
            .collect();

        let backfill = shuffle_with(&builtin_same_grade, rng)
            .into_iter()
            .chain(shuffle_with(&builtin_other, rng));
        for q in backfill {
            if pool.len() >= EXAM_QUESTION_COUNT {
                break;
            }
            if !pool.iter().any(|p| p.id == q.id) {
                pool.push(q);
            }
        }
    }

    sample(&pool, EXAM_QUESTION_COUNT, rng)
}

fn sample<R: Rng + ?Sized>(pool: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    shuffle_with(pool, rng)
        .into_iter()
        .take(count)
        .map(|q| shuffle_options_with(&q, rng))
        .collect()
}
