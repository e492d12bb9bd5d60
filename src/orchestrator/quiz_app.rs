//! 测验应用 - 编排层
//!
//! ## 职责
//!
//! 把登录身份、题库、出题服务和正在进行的答题流程串起来：
//!
//! 1. **身份**：注册、登录、登出、修改密码
//! 2. **开始答题**：练习 / 考试（准入检查 + 倒计时）/ AI 出题练习
//! 3. **答题过程**：作答、翻题、交卷，交卷或超时后保存成绩
//! 4. **管理**：考试时间窗口、激活开关、自建题库
//! 5. **统计视图**：排行榜、进度曲线、主题雷达、历史记录、导出
//!
//! 同一时间最多一个答题流程；开始新的答题、登出都会放弃当前流程

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AdmissionError, AppResult, LlmError, SessionError};
use crate::infrastructure::KvStore;
use crate::models::{
    load_builtin_questions, load_question_bank, ExamStatus, Examinee, Grade, Principal, Question, QuizResult,
    Registration, User, KNOWN_TOPICS,
};
use crate::services::export::export_to_file;
use crate::services::llm_service::{GenerationRequest, QuestionGenerator};
use crate::services::repository::Repository;
use crate::services::selector::{self, QuestionFilter};
use crate::services::shuffle::shuffle_options;
use crate::services::stats::{self, ProgressPoint, TopicScore};
use crate::services::exam_gate;
use crate::utils::logging;
use crate::workflow::{Advance, FunQuiz, QuizFlow, QuizMode, QuizSession, SessionState};

/// 测验应用
pub struct QuizApp<S: KvStore, G: QuestionGenerator> {
    config: Config,
    repo: Repository<S>,
    builtin: Vec<Question>,
    generator: G,
    principal: Option<Principal>,
    active: Option<QuizFlow>,
    fun_quiz: FunQuiz,
}

impl<S: KvStore, G: QuestionGenerator> QuizApp<S, G> {
    /// 使用内置题库初始化应用；配置了额外题库文件时一并加载
    pub async fn initialize(config: Config, store: S, generator: G) -> anyhow::Result<Self> {
        let mut builtin = load_builtin_questions()?;
        if let Some(path) = &config.extra_question_bank {
            let extra = load_question_bank(Path::new(path)).await?;
            info!("📚 额外题库 {}: {} 道", path, extra.len());
            builtin.extend(extra);
        }
        logging::log_startup(&config.store_dir, builtin.len());
        Ok(Self::new(config, store, generator, builtin)?)
    }

    /// 使用指定的内置题目创建应用
    pub fn new(config: Config, store: S, generator: G, builtin: Vec<Question>) -> AppResult<Self> {
        let repo = Repository::load(store, &config.default_admin_password)?;
        Ok(Self {
            config,
            repo,
            builtin,
            generator,
            principal: None,
            active: None,
            fun_quiz: FunQuiz::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn builtin_questions(&self) -> &[Question] {
        &self.builtin
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    fn require_login(&self) -> Result<&Principal, AdmissionError> {
        self.principal.as_ref().ok_or(AdmissionError::NotLoggedIn)
    }

    fn require_privileged(&self, action: &'static str) -> Result<&Principal, AdmissionError> {
        let principal = self.require_login()?;
        if principal.is_privileged() {
            Ok(principal)
        } else {
            Err(AdmissionError::NotPermitted { action })
        }
    }

    fn require_admin(&self, action: &'static str) -> Result<(), AdmissionError> {
        match self.require_login()? {
            Principal::Admin => Ok(()),
            Principal::User(_) => Err(AdmissionError::NotPermitted { action }),
        }
    }

    // ========== 身份 ==========

    pub fn register(&mut self, form: Registration, now: DateTime<Utc>) -> AppResult<User> {
        self.repo.register(form, now)
    }

    /// 登录；切换身份前先结束当前答题
    pub async fn login(&mut self, username: &str, password: &str) -> AppResult<&Principal> {
        let principal = self.repo.login(username, password)?;
        self.abandon_quiz().await?;
        info!("✓ {} 已登录", principal.display_name());
        Ok(&*self.principal.insert(principal))
    }

    /// 登出；已超时交卷的成绩照常保存，进行中的答题放弃
    pub async fn logout(&mut self) -> AppResult<()> {
        self.abandon_quiz().await?;
        if let Some(principal) = self.principal.take() {
            info!("{} 已登出", principal.display_name());
        }
        Ok(())
    }

    pub fn change_password(&mut self, old: &str, new: &str, confirm: &str) -> AppResult<()> {
        let principal = self.require_login()?.clone();
        self.repo.change_password(&principal, old, new, confirm)
    }

    // ========== 开始答题 ==========

    async fn begin(
        &mut self,
        mode: QuizMode,
        questions: Vec<Question>,
        countdown_seconds: Option<u32>,
    ) -> AppResult<usize> {
        let examinee = Examinee::from(self.require_login()?);
        let total = questions.len();

        let flow = QuizFlow::start(QuizSession::new(examinee, mode, questions, countdown_seconds))?;
        self.abandon_quiz().await?;
        self.active = Some(flow);
        Ok(total)
    }

    /// 开放练习，返回题目数量
    pub async fn start_practice(&mut self, filter: QuestionFilter) -> AppResult<usize> {
        self.require_login()?;

        let questions = selector::pick_practice(&filter, &self.builtin, self.repo.authored_questions());
        let mode = QuizMode::Practice {
            grade: filter.grade,
            topic: filter.topic,
        };
        self.begin(mode, questions, None).await
    }

    /// 正式考试：准入检查后抽 10 题，按配置时长倒计时
    ///
    /// 准入前先保存已超时交卷的成绩，避免同一场考试被重考
    pub async fn start_exam(&mut self, grade: Grade, now: DateTime<Utc>) -> AppResult<usize> {
        self.require_login()?;
        self.collect_finished().await?;
        let principal = self.require_login()?;
        exam_gate::admit(
            principal,
            grade,
            now,
            self.repo.exam_configs(),
            self.repo.results(),
        )?;

        let questions = selector::pick_exam(grade, &self.builtin, self.repo.authored_questions());
        let countdown = self
            .repo
            .exam_config(grade)
            .map(|cfg| cfg.duration_seconds())
            .filter(|s| *s > 0);

        self.begin(QuizMode::Exam { grade }, questions, countdown).await
    }

    /// AI 出题练习；生成失败时当前状态不变
    pub async fn start_ai_practice(&mut self, topic: &str, count: usize) -> AppResult<usize> {
        self.require_login()?;

        let request = GenerationRequest::new(topic, count);
        let generated = self.generator.generate_questions(&request).await?;
        if generated.is_empty() {
            return Err(LlmError::NoQuestions.into());
        }

        let questions = generated.iter().map(shuffle_options).collect();
        self.begin(
            QuizMode::AiPractice {
                topic: topic.to_string(),
            },
            questions,
            None,
        )
        .await
    }

    /// AI 生成题目并加入自建题库（教师/管理员）
    pub async fn generate_into_bank(
        &mut self,
        topic: &str,
        count: usize,
        grade: Option<Grade>,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        self.require_privileged("generate_questions")?;

        let request = GenerationRequest::new(topic, count);
        let generated = self.generator.generate_questions(&request).await?;
        let questions = generated
            .into_iter()
            .map(|q| match grade {
                Some(g) => q.with_grade(g),
                None => q,
            })
            .collect();

        self.repo.add_questions(questions, now)
    }

    // ========== 答题过程 ==========

    fn active_flow(&mut self) -> Result<&mut QuizFlow, SessionError> {
        self.active.as_mut().ok_or(SessionError::NoActiveSession)
    }

    pub fn has_active_quiz(&self) -> bool {
        self.active.is_some()
    }

    /// 当前答题会话的快照
    pub async fn session_snapshot(&self) -> Option<QuizSession> {
        match &self.active {
            Some(flow) => Some(flow.snapshot().await),
            None => None,
        }
    }

    pub async fn answer(&mut self, choice: usize) -> AppResult<()> {
        let flow = self.active_flow()?;
        Ok(flow.answer_current(choice).await?)
    }

    pub async fn answer_at(&mut self, index: usize, choice: usize) -> AppResult<()> {
        let flow = self.active_flow()?;
        Ok(flow.answer(index, choice).await?)
    }

    pub async fn prev(&mut self) -> AppResult<usize> {
        let flow = self.active_flow()?;
        Ok(flow.retreat().await?)
    }

    /// 下一题；最后一题时交卷并保存成绩
    pub async fn next(&mut self, now: DateTime<Utc>) -> AppResult<Advance> {
        let flow = self.active_flow()?;
        match flow.advance(now).await {
            Ok(Advance::Finished(result)) => {
                self.complete(result.clone())?;
                Ok(Advance::Finished(result))
            }
            Ok(moved) => Ok(moved),
            Err(SessionError::Finished) => self
                .poll_auto_submit()
                .await?
                .map(Advance::Finished)
                .ok_or_else(|| SessionError::Finished.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// 交卷（练习中途结束同样使用全部题数作为分母）
    ///
    /// 若已超时自动交卷，返回自动交卷的成绩
    pub async fn submit(&mut self, now: DateTime<Utc>) -> AppResult<QuizResult> {
        let flow = self.active_flow()?;
        match flow.submit(now).await {
            Ok(result) => {
                self.complete(result.clone())?;
                Ok(result)
            }
            Err(SessionError::Finished) => self
                .poll_auto_submit()
                .await?
                .ok_or_else(|| SessionError::Finished.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// 检查是否已超时自动交卷；是则保存成绩并结束流程
    pub async fn poll_auto_submit(&mut self) -> AppResult<Option<QuizResult>> {
        let Some(flow) = self.active.as_mut() else {
            return Ok(None);
        };

        let expired = match flow.try_take_expired() {
            Some(result) => Some(result),
            None if flow.state().await == SessionState::Finished => {
                match flow.wait_for_timeout().await {
                    Some(result) => Some(result),
                    None => flow.finished_result().await,
                }
            }
            None => None,
        };

        match expired {
            Some(result) => {
                self.complete(result.clone())?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// 等待倒计时结束并保存自动交卷的成绩
    pub async fn wait_for_auto_submit(&mut self) -> AppResult<Option<QuizResult>> {
        let flow = self.active_flow()?;
        let expired = match flow.wait_for_timeout().await {
            Some(result) => Some(result),
            None => flow.finished_result().await,
        };
        match expired {
            Some(result) => {
                self.complete(result.clone())?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// 保存成功后才结束流程；保存失败时流程保留，可以再次交卷
    fn complete(&mut self, result: QuizResult) -> AppResult<()> {
        self.repo.record_result(result)?;
        self.active = None;
        Ok(())
    }

    /// 保存已交卷但尚未入库的成绩，进行中的答题不受影响
    async fn collect_finished(&mut self) -> AppResult<()> {
        let Some(flow) = self.active.as_ref() else {
            return Ok(());
        };
        match flow.finished_result().await {
            Some(result) => self.complete(result),
            None => Ok(()),
        }
    }

    /// 结束当前流程
    ///
    /// 已交卷（包括超时自动交卷）的成绩照常保存；仍在进行的答题放弃，不产生成绩
    pub async fn abandon_quiz(&mut self) -> AppResult<()> {
        let Some(flow) = self.active.as_mut() else {
            return Ok(());
        };

        match flow.settle().await {
            Some(result) => self.complete(result),
            None => {
                if let Some(flow) = self.active.take() {
                    warn!("放弃未完成的答题");
                    flow.abandon();
                }
                Ok(())
            }
        }
    }

    // ========== 趣味小测验 ==========

    pub fn fun_quiz(&self) -> &FunQuiz {
        &self.fun_quiz
    }

    pub fn fun_quiz_mut(&mut self) -> &mut FunQuiz {
        &mut self.fun_quiz
    }

    pub async fn start_fun_quiz(&mut self, name: &str, grade: Grade) -> AppResult<usize> {
        self.fun_quiz.start(&self.generator, name, grade).await
    }

    pub async fn fun_assessment(&mut self) -> AppResult<String> {
        let text = self.fun_quiz.assessment(&self.generator).await?;
        Ok(text.to_string())
    }

    // ========== 管理 ==========

    pub fn set_exam_window(
        &mut self,
        grade: Grade,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_minutes: u32,
    ) -> AppResult<()> {
        self.require_admin("set_exam_window")?;
        self.repo.set_exam_window(grade, start, end, duration_minutes)
    }

    pub fn toggle_exam_active(&mut self, grade: Grade) -> AppResult<bool> {
        self.require_admin("toggle_exam_active")?;
        self.repo.toggle_exam_active(grade)
    }

    pub fn add_question(&mut self, question: Question, now: DateTime<Utc>) -> AppResult<Question> {
        self.require_privileged("add_question")?;
        self.repo.add_question(question, now)
    }

    pub fn update_question(&mut self, question: Question) -> AppResult<()> {
        self.require_privileged("update_question")?;
        self.repo.update_question(question)
    }

    pub fn delete_question(&mut self, question_id: &str) -> AppResult<()> {
        self.require_privileged("delete_question")?;
        self.repo.delete_question(question_id)
    }

    // ========== 统计视图 ==========

    pub fn ranking(&self) -> Vec<&QuizResult> {
        stats::ranking(self.repo.results())
    }

    pub fn progress(&self) -> AppResult<Vec<ProgressPoint>> {
        let principal = self.require_login()?;
        Ok(stats::progress_series(self.repo.results(), principal))
    }

    pub fn topic_radar(&self) -> Vec<TopicScore> {
        stats::topic_radar(self.repo.results(), &KNOWN_TOPICS[..])
    }

    pub fn history(&self) -> AppResult<Vec<&QuizResult>> {
        let principal = self.require_login()?;
        Ok(stats::user_history(self.repo.results(), principal.user_id()))
    }

    /// 各年级考试状态
    pub fn exam_statuses(&self, now: DateTime<Utc>) -> Vec<(Grade, ExamStatus)> {
        Grade::all()
            .map(|g| (g, exam_gate::status_label(self.repo.exam_configs(), g, now)))
            .collect()
    }

    /// 导出全部成绩为 CSV（教师/管理员）
    pub async fn export_csv(&self) -> AppResult<PathBuf> {
        self.require_privileged("export_results")?;
        let path = PathBuf::from(&self.config.export_path);
        export_to_file(self.repo.results(), &path).await?;
        Ok(path)
    }
}
