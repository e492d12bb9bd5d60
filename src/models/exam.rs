use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 每个年级的考试配置
///
/// 默认值：时间窗口为纪元零点、时长 0、未激活
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: u32,
    pub active: bool,
}

impl GradeConfig {
    /// 激活且当前时间位于 [start, end] 内
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == ExamStatus::Open
    }

    pub fn status(&self, now: DateTime<Utc>) -> ExamStatus {
        if !self.active {
            ExamStatus::Locked
        } else if now < self.start {
            ExamStatus::Upcoming
        } else if now > self.end {
            ExamStatus::Closed
        } else {
            ExamStatus::Open
        }
    }

    /// 考试倒计时总秒数
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }
}

/// 考试状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Locked,
    Upcoming,
    Closed,
    Open,
}

impl ExamStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamStatus::Locked => "locked",
            ExamStatus::Upcoming => "upcoming",
            ExamStatus::Closed => "closed",
            ExamStatus::Open => "open",
        }
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
