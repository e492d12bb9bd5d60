//! 考试准入
//!
//! 年级考试配置的查询、准入判断与管理员修改

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{AdmissionError, ValidationError};
use crate::models::result::label;
use crate::models::{ExamStatus, Grade, GradeConfig, Principal, QuizResult};

/// 年级 → 考试配置
pub type ExamConfigs = BTreeMap<Grade, GradeConfig>;

/// 配置存在 ∧ 激活 ∧ start ≤ now ≤ end
pub fn is_exam_open(configs: &ExamConfigs, grade: Grade, now: DateTime<Utc>) -> bool {
    configs.get(&grade).is_some_and(|cfg| cfg.is_open(now))
}

/// 没有配置视为未激活
pub fn status_label(configs: &ExamConfigs, grade: Grade, now: DateTime<Utc>) -> ExamStatus {
    configs
        .get(&grade)
        .map_or(ExamStatus::Locked, |cfg| cfg.status(now))
}

/// 用户是否已参加过该年级的正式考试
pub fn has_attempted(results: &[QuizResult], user_id: &str, grade: Grade) -> bool {
    results
        .iter()
        .any(|r| r.user_id == user_id && label::is_exam_for(&r.label, grade))
}

/// 考试准入检查
///
/// 特权角色（教师、管理员）绕过时间窗口和单次作答限制；
/// 学生先检查是否已考过，再检查时间窗口
pub fn admit(
    principal: &Principal,
    grade: Grade,
    now: DateTime<Utc>,
    configs: &ExamConfigs,
    results: &[QuizResult],
) -> Result<(), AdmissionError> {
    if principal.is_privileged() {
        return Ok(());
    }

    let user_id = principal.user_id();
    if has_attempted(results, user_id, grade) {
        return Err(AdmissionError::AlreadyAttempted {
            user_id: user_id.to_string(),
            grade,
        });
    }

    match status_label(configs, grade, now) {
        ExamStatus::Open => Ok(()),
        status => Err(AdmissionError::NotOpen { grade, status }),
    }
}

/// 同时设置考试时间窗口和时长
pub fn set_exam_window(
    configs: &mut ExamConfigs,
    grade: Grade,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    duration_minutes: u32,
) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::InvalidWindow);
    }
    if duration_minutes == 0 {
        return Err(ValidationError::ZeroDuration);
    }

    let cfg = configs.entry(grade).or_default();
    cfg.start = start;
    cfg.end = end;
    cfg.duration_minutes = duration_minutes;

    info!(
        "{} 年级考试时间: {} ~ {}，时长 {} 分钟",
        grade, start, end, duration_minutes
    );
    Ok(())
}

/// 切换激活状态，返回切换后的值
pub fn toggle_exam_active(configs: &mut ExamConfigs, grade: Grade) -> bool {
    let cfg = configs.entry(grade).or_default();
    cfg.active = !cfg.active;
    info!("{} 年级考试已{}", grade, if cfg.active { "激活" } else { "锁定" });
    cfg.active
}
