//! 趣味小测验的数据结构
//!
//! 题目由 AI 生成，分为知识题、动作题、识别题三类

use serde::{Deserialize, Serialize};

/// 趣味题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunQuestionKind {
    /// 知识（选择题）
    Knowledge,
    /// 动作（跟做 + 倒计时）
    Action,
    /// 识别（图片/器材识别）
    Identify,
}

/// 趣味题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunQuestion {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: FunQuestionKind,
    pub title: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// 动作题的倒计时秒数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
}

impl FunQuestion {
    /// 动作题且配置了倒计时
    pub fn action_duration(&self) -> Option<u32> {
        match self.kind {
            FunQuestionKind::Action => self.duration.filter(|d| *d > 0),
            _ => None,
        }
    }
}

/// 单道趣味题的得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunTaskResult {
    pub question_id: u32,
    /// 0 或 100
    pub score: u32,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generated_shape() {
        let json = r#"{"id":3,"type":"ACTION","title":"Bật nhảy","instruction":"Bật nhảy tại chỗ","duration":20}"#;
        let q: FunQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind, FunQuestionKind::Action);
        assert_eq!(q.action_duration(), Some(20));
        assert!(q.options.is_none());
    }

    #[test]
    fn test_duration_ignored_for_knowledge() {
        let json = r#"{"id":1,"type":"KNOWLEDGE","title":"t","instruction":"i","options":["a","b"],"correctAnswer":"a","duration":5}"#;
        let q: FunQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.action_duration(), None);
    }
}
