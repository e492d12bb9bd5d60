//! 答题会话状态机 - 流程层
//!
//! NotStarted → Running → Finished
//!
//! 会话只负责"当前第几题、选了什么、还剩几秒"，交卷时计算成绩；
//! 不接触存储，不持有计时任务（见 `countdown`）

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::models::result::label;
use crate::models::{Examinee, Grade, Question, QuizResult};
use crate::services::scoring::build_result;
use crate::utils::logging;

/// 答题模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizMode {
    /// 开放练习
    Practice {
        grade: Option<Grade>,
        topic: Option<String>,
    },
    /// AI 出题练习
    AiPractice { topic: String },
    /// 正式考试
    Exam { grade: Grade },
}

impl QuizMode {
    /// 成绩标签
    pub fn label(&self, auto_submitted: bool) -> String {
        match self {
            QuizMode::Practice { grade, topic } => label::practice(*grade, topic.as_deref()),
            QuizMode::AiPractice { topic } => label::ai_practice(topic),
            QuizMode::Exam { grade } => label::exam(*grade, auto_submitted),
        }
    }

    pub fn is_exam(&self) -> bool {
        matches!(self, QuizMode::Exam { .. })
    }
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Finished,
}

#[derive(Debug, Clone)]
enum Phase {
    NotStarted,
    Running,
    Finished {
        result: QuizResult,
        auto_submitted: bool,
    },
}

/// 前进一题的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// 移动到了新的题目索引
    Moved(usize),
    /// 已是最后一题，交卷
    Finished(QuizResult),
}

/// 计时一秒的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// 会话未在进行或没有倒计时，忽略
    Idle,
    /// 剩余秒数
    Remaining(u32),
    /// 时间到，自动交卷
    Expired(QuizResult),
}

/// 答题会话
#[derive(Debug, Clone)]
pub struct QuizSession {
    examinee: Examinee,
    mode: QuizMode,
    questions: Vec<Question>,
    index: usize,
    answers: Vec<Option<usize>>,
    remaining_seconds: Option<u32>,
    phase: Phase,
}

impl QuizSession {
    /// 创建会话，`countdown_seconds` 为 None 时不限时
    pub fn new(
        examinee: Examinee,
        mode: QuizMode,
        questions: Vec<Question>,
        countdown_seconds: Option<u32>,
    ) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            examinee,
            mode,
            questions,
            index: 0,
            answers,
            remaining_seconds: countdown_seconds,
            phase: Phase::NotStarted,
        }
    }

    /// 进入 Running
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::NotStarted => {}
            Phase::Running => return Err(SessionError::AlreadyStarted),
            Phase::Finished { .. } => return Err(SessionError::Finished),
        }
        if self.questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }

        self.phase = Phase::Running;
        logging::log_session_start(
            &self.examinee.student_name,
            &self.mode.label(false),
            self.questions.len(),
            self.remaining_seconds,
        );
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::NotStarted => SessionState::NotStarted,
            Phase::Running => SessionState::Running,
            Phase::Finished { .. } => SessionState::Finished,
        }
    }

    pub fn mode(&self) -> &QuizMode {
        &self.mode
    }

    pub fn examinee(&self) -> &Examinee {
        &self.examinee
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    pub fn has_countdown(&self) -> bool {
        self.remaining_seconds.is_some()
    }

    /// 交卷后的成绩
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            Phase::Finished { result, .. } => Some(result),
            _ => None,
        }
    }

    /// 是否因超时自动交卷
    pub fn was_auto_submitted(&self) -> bool {
        matches!(self.phase, Phase::Finished { auto_submitted: true, .. })
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::NotStarted => Err(SessionError::NotStarted),
            Phase::Running => Ok(()),
            Phase::Finished { .. } => Err(SessionError::Finished),
        }
    }

    /// 记录第 i 题的选择，不移动当前题目；重复作答会覆盖
    pub fn answer(&mut self, i: usize, choice: usize) -> Result<(), SessionError> {
        self.ensure_running()?;

        let question = self.questions.get(i).ok_or(SessionError::QuestionOutOfRange {
            index: i,
            max_index: self.questions.len().saturating_sub(1),
        })?;
        if choice >= question.options.len() {
            return Err(SessionError::ChoiceOutOfRange {
                choice,
                max_index: question.options.len().saturating_sub(1),
            });
        }

        self.answers[i] = Some(choice);
        debug!("第 {} 题选择 {}", i + 1, choice);
        Ok(())
    }

    /// 记录当前题目的选择
    pub fn answer_current(&mut self, choice: usize) -> Result<(), SessionError> {
        self.answer(self.index, choice)
    }

    /// 下一题；已是最后一题时交卷
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        self.ensure_running()?;

        if self.index + 1 < self.questions.len() {
            self.index += 1;
            Ok(Advance::Moved(self.index))
        } else {
            self.finish(false, now).map(Advance::Finished)
        }
    }

    /// 上一题；已是第一题时不动
    pub fn retreat(&mut self) -> Result<usize, SessionError> {
        self.ensure_running()?;

        if self.index > 0 {
            self.index -= 1;
        }
        Ok(self.index)
    }

    /// 撤掉倒计时，之后的 tick 都是 Idle；已交卷时不变
    pub fn disarm_countdown(&mut self) {
        if matches!(self.phase, Phase::Running) {
            self.remaining_seconds = None;
        }
    }

    /// 倒计时一秒；归零时强制交卷，之后的计时全部忽略
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        if !matches!(self.phase, Phase::Running) {
            return Tick::Idle;
        }
        let Some(remaining) = self.remaining_seconds else {
            return Tick::Idle;
        };

        let remaining = remaining.saturating_sub(1);
        self.remaining_seconds = Some(remaining);

        if remaining > 0 {
            return Tick::Remaining(remaining);
        }

        match self.finish(true, now) {
            Ok(result) => Tick::Expired(result),
            Err(_) => Tick::Idle,
        }
    }

    /// 交卷：进入终态并计算成绩，只能发生一次
    ///
    /// 未作答的题目算错，分母始终是全部题数
    pub fn finish(&mut self, auto_submitted: bool, now: DateTime<Utc>) -> Result<QuizResult, SessionError> {
        self.ensure_running()?;

        let result = build_result(
            &self.examinee,
            &self.questions,
            &self.answers,
            self.mode.label(auto_submitted),
            now,
        );

        logging::log_session_finished(
            &self.examinee.student_name,
            result.score,
            result.correct_count,
            result.total_questions,
            auto_submitted,
        );
        info!(
            "已作答 {}/{} 题",
            self.answered_count(),
            self.questions.len()
        );

        self.phase = Phase::Finished {
            result: result.clone(),
            auto_submitted,
        };
        Ok(result)
    }
}
