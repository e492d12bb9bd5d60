//! 洗牌工具
//!
//! 题目顺序和选项顺序的随机排列

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Question;

/// 返回打乱顺序后的副本，原序列不变
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::thread_rng())
}

/// 使用指定随机源打乱（Fisher–Yates）
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// 打乱题目选项，并同步更新正确答案索引
pub fn shuffle_options(question: &Question) -> Question {
    shuffle_options_with(question, &mut rand::thread_rng())
}

pub fn shuffle_options_with<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    let mut paired: Vec<(String, bool)> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| (opt.clone(), i == question.correct_index))
        .collect();
    paired.shuffle(rng);

    let correct_index = paired
        .iter()
        .position(|(_, is_correct)| *is_correct)
        .unwrap_or(question.correct_index);

    Question {
        options: paired.into_iter().map(|(opt, _)| opt).collect(),
        correct_index,
        ..question.clone()
    }
}
