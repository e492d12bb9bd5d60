//! 趣味小测验 - 流程层
//!
//! Start → Playing → Assessment
//!
//! 题目和最终评语都来自出题服务；评语失败时使用固定文案

use tracing::{info, warn};

use crate::error::{AppResult, LlmError, SessionError, ValidationError};
use crate::models::{FunQuestion, FunQuestionKind, FunTaskResult, Grade};
use crate::services::llm_service::{QuestionGenerator, FALLBACK_ASSESSMENT};

const CORRECT_FEEDBACK: &str = "Tuyệt vời!";
const WRONG_FEEDBACK: &str = "Cố gắng hơn nhé!";
const ACTION_FEEDBACK: &str = "Bé làm tốt lắm!";
const ACTION_DONE: &str = "Đã hoàn thành";

/// 小测验阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunStage {
    Start,
    Playing,
    Assessment,
}

/// 趣味小测验
#[derive(Debug, Clone)]
pub struct FunQuiz {
    stage: FunStage,
    player_name: String,
    grade: Option<Grade>,
    questions: Vec<FunQuestion>,
    index: usize,
    results: Vec<FunTaskResult>,
    action_remaining: Option<u32>,
    assessment: Option<String>,
}

impl Default for FunQuiz {
    fn default() -> Self {
        Self::new()
    }
}

impl FunQuiz {
    pub fn new() -> Self {
        Self {
            stage: FunStage::Start,
            player_name: String::new(),
            grade: None,
            questions: Vec::new(),
            index: 0,
            results: Vec::new(),
            action_remaining: None,
            assessment: None,
        }
    }

    pub fn stage(&self) -> FunStage {
        self.stage
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn questions(&self) -> &[FunQuestion] {
        &self.questions
    }

    pub fn results(&self) -> &[FunTaskResult] {
        &self.results
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&FunQuestion> {
        match self.stage {
            FunStage::Playing => self.questions.get(self.index),
            _ => None,
        }
    }

    pub fn action_remaining(&self) -> Option<u32> {
        self.action_remaining
    }

    /// 生成题目并进入 Playing；生成失败时保持原状态
    ///
    /// # 参数
    /// - `generator`: 出题服务
    /// - `name`: 小朋友的名字，不能为空
    /// - `grade`: 年级
    pub async fn start<G: QuestionGenerator>(
        &mut self,
        generator: &G,
        name: &str,
        grade: Grade,
    ) -> AppResult<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" }.into());
        }

        let questions = generator.generate_fun_questions(grade).await?;
        if questions.is_empty() {
            return Err(LlmError::NoQuestions.into());
        }

        info!("🎮 {} 开始趣味小测验（{} 年级，{} 道题）", name, grade, questions.len());

        *self = Self {
            stage: FunStage::Playing,
            player_name: name.to_string(),
            grade: Some(grade),
            questions,
            ..Self::new()
        };
        Ok(self.questions.len())
    }

    fn playing(&self) -> Result<&FunQuestion, SessionError> {
        match self.stage {
            FunStage::Start => Err(SessionError::NotStarted),
            FunStage::Assessment => Err(SessionError::Finished),
            FunStage::Playing => self.questions.get(self.index).ok_or(SessionError::Finished),
        }
    }

    fn record(&mut self, result: FunTaskResult) {
        self.results.push(result);
        self.action_remaining = None;
        self.index += 1;
        if self.index >= self.questions.len() {
            self.stage = FunStage::Assessment;
            info!("🏁 {} 完成全部 {} 道题", self.player_name, self.questions.len());
        }
    }

    /// 知识题/识别题作答：答对 100 分，答错 0 分
    pub fn choose(&mut self, option: &str) -> Result<FunTaskResult, SessionError> {
        let question = self.playing()?;
        if question.kind == FunQuestionKind::Action {
            return Err(SessionError::WrongQuestionKind);
        }

        let correct = question.correct_answer.as_deref() == Some(option);
        let result = FunTaskResult {
            question_id: question.id,
            score: if correct { 100 } else { 0 },
            feedback: if correct { CORRECT_FEEDBACK } else { WRONG_FEEDBACK }.to_string(),
            user_answer: Some(option.to_string()),
        };

        self.record(result.clone());
        Ok(result)
    }

    /// 开始动作题倒计时，返回秒数
    pub fn start_action(&mut self) -> Result<u32, SessionError> {
        let question = self.playing()?;
        if question.kind != FunQuestionKind::Action {
            return Err(SessionError::WrongQuestionKind);
        }

        let seconds = question.action_duration().unwrap_or(0);
        self.action_remaining = Some(seconds);
        Ok(seconds)
    }

    /// 动作题倒计时一秒
    pub fn tick_action(&mut self) -> Option<u32> {
        let remaining = self.action_remaining?.saturating_sub(1);
        self.action_remaining = Some(remaining);
        Some(remaining)
    }

    /// 完成动作题，固定 100 分；有倒计时的题目必须先开始并走完倒计时
    pub fn complete_action(&mut self) -> Result<FunTaskResult, SessionError> {
        let question = self.playing()?;
        if question.kind != FunQuestionKind::Action {
            return Err(SessionError::WrongQuestionKind);
        }
        if let Some(duration) = question.action_duration() {
            match self.action_remaining {
                Some(0) => {}
                Some(remaining) => return Err(SessionError::ActionInProgress { remaining }),
                None => return Err(SessionError::ActionInProgress { remaining: duration }),
            }
        }

        let result = FunTaskResult {
            question_id: question.id,
            score: 100,
            feedback: ACTION_FEEDBACK.to_string(),
            user_answer: Some(ACTION_DONE.to_string()),
        };

        self.record(result.clone());
        Ok(result)
    }

    /// 平均得分百分比（四舍五入）
    pub fn accuracy(&self) -> u32 {
        if self.results.is_empty() {
            return 0;
        }
        let total: u32 = self.results.iter().map(|r| r.score).sum();
        (total as f64 / self.results.len() as f64).round() as u32
    }

    /// 老师评语；只请求一次，失败时使用固定文案
    pub async fn assessment<G: QuestionGenerator>(&mut self, generator: &G) -> Result<&str, SessionError> {
        let (FunStage::Assessment, Some(grade)) = (self.stage, self.grade) else {
            return Err(SessionError::NotStarted);
        };

        if self.assessment.is_none() {
            let text = match generator.assess_fun_results(&self.results, grade).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => FALLBACK_ASSESSMENT.to_string(),
                Err(e) => {
                    warn!("生成评语失败，使用默认评语: {}", e);
                    FALLBACK_ASSESSMENT.to_string()
                }
            };
            self.assessment = Some(text);
        }

        Ok(self.assessment.as_deref().unwrap_or(FALLBACK_ASSESSMENT))
    }

    /// 回到开始界面
    pub fn restart(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Question;
    use crate::services::llm_service::GenerationRequest;

    struct StubGenerator {
        fail: bool,
    }

    impl QuestionGenerator for StubGenerator {
        async fn generate_questions(&self, _request: &GenerationRequest) -> AppResult<Vec<Question>> {
            Ok(Vec::new())
        }

        async fn generate_fun_questions(&self, _grade: Grade) -> AppResult<Vec<FunQuestion>> {
            if self.fail {
                return Err(LlmError::NoQuestions.into());
            }
            Ok(vec![
                FunQuestion {
                    id: 1,
                    kind: FunQuestionKind::Knowledge,
                    title: "Bóng đá".into(),
                    instruction: "Mỗi đội có mấy người?".into(),
                    options: Some(vec!["5".into(), "11".into()]),
                    correct_answer: Some("11".into()),
                    duration: None,
                    image_hint: None,
                },
                FunQuestion {
                    id: 2,
                    kind: FunQuestionKind::Action,
                    title: "Bật nhảy".into(),
                    instruction: "Bật nhảy tại chỗ".into(),
                    options: None,
                    correct_answer: None,
                    duration: Some(3),
                    image_hint: None,
                },
            ])
        }

        async fn assess_fun_results(&self, _results: &[FunTaskResult], _grade: Grade) -> AppResult<String> {
            if self.fail {
                return Err(LlmError::NoQuestions.into());
            }
            Ok("Giỏi lắm!".into())
        }
    }

    #[tokio::test]
    async fn test_full_round() {
        let generator = StubGenerator { fail: false };
        let mut quiz = FunQuiz::new();
        assert_eq!(quiz.start(&generator, " Bi ", Grade::new(2).unwrap()).await.unwrap(), 2);
        assert_eq!(quiz.player_name(), "Bi");

        assert_eq!(quiz.start_action(), Err(SessionError::WrongQuestionKind));
        let r = quiz.choose("5").unwrap();
        assert_eq!((r.score, r.feedback.as_str()), (0, WRONG_FEEDBACK));

        assert_eq!(quiz.choose("x"), Err(SessionError::WrongQuestionKind));
        assert_eq!(quiz.start_action(), Ok(3));
        assert_eq!(quiz.tick_action(), Some(2));
        assert_eq!(
            quiz.complete_action(),
            Err(SessionError::ActionInProgress { remaining: 2 })
        );
        quiz.tick_action();
        quiz.tick_action();
        assert_eq!(quiz.complete_action().unwrap().score, 100);

        assert_eq!(quiz.stage(), FunStage::Assessment);
        assert_eq!(quiz.accuracy(), 50);
        assert_eq!(quiz.assessment(&generator).await.unwrap(), "Giỏi lắm!");

        quiz.restart();
        assert_eq!(quiz.stage(), FunStage::Start);
    }

    #[tokio::test]
    async fn test_timed_action_requires_countdown() {
        let mut quiz = FunQuiz::new();
        quiz.start(&StubGenerator { fail: false }, "Bo", Grade::new(4).unwrap())
            .await
            .unwrap();
        quiz.choose("11").unwrap();

        assert_eq!(
            quiz.complete_action(),
            Err(SessionError::ActionInProgress { remaining: 3 })
        );
        assert_eq!(quiz.stage(), FunStage::Playing);
        assert_eq!(quiz.tick_action(), None);

        quiz.start_action().unwrap();
        for _ in 0..3 {
            quiz.tick_action();
        }
        assert_eq!(quiz.complete_action().unwrap().score, 100);
        assert_eq!(quiz.stage(), FunStage::Assessment);
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_start_state() {
        let mut quiz = FunQuiz::new();
        let err = quiz
            .start(&StubGenerator { fail: true }, "Bi", Grade::new(1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::Llm(LlmError::NoQuestions)));
        assert_eq!(quiz.stage(), FunStage::Start);

        assert!(quiz.start(&StubGenerator { fail: false }, "  ", Grade::new(1).unwrap()).await.is_err());
        assert_eq!(quiz.choose("11"), Err(SessionError::NotStarted));
    }

    #[tokio::test]
    async fn test_assessment_falls_back() {
        let mut quiz = FunQuiz::new();
        quiz.start(&StubGenerator { fail: false }, "Na", Grade::new(3).unwrap())
            .await
            .unwrap();
        quiz.choose("11").unwrap();
        quiz.start_action().unwrap();
        for _ in 0..3 {
            quiz.tick_action();
        }
        quiz.complete_action().unwrap();

        let text = quiz.assessment(&StubGenerator { fail: true }).await.unwrap();
        assert_eq!(text, FALLBACK_ASSESSMENT);
        assert_eq!(quiz.accuracy(), 100);
    }
}
