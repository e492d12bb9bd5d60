//! 一次答题的完整流程 - 流程层
//!
//! 持有共享会话和（可选的）倒计时任务：
//! - 会话离开 Running 时立即停止倒计时
//! - 手动交卷与超时交卷由会话锁保证只发生一次
//! - drop 即放弃，不产生成绩

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::models::{Question, QuizResult};
use crate::workflow::countdown::{Countdown, SharedSession};
use crate::workflow::session::{Advance, QuizMode, QuizSession, SessionState};

/// 正在进行的答题流程
pub struct QuizFlow {
    session: SharedSession,
    countdown: Option<Countdown>,
    expired: Option<oneshot::Receiver<QuizResult>>,
}

impl QuizFlow {
    /// 开始会话；有倒计时则同时启动计时任务
    pub fn start(mut session: QuizSession) -> Result<Self, SessionError> {
        session.start()?;
        let timed = session.has_countdown();
        let session = Arc::new(Mutex::new(session));

        let (countdown, expired) = if timed {
            let (countdown, rx) = Countdown::spawn(session.clone());
            (Some(countdown), Some(rx))
        } else {
            (None, None)
        };

        Ok(Self {
            session,
            countdown,
            expired,
        })
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
            debug!("倒计时已停止");
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    pub async fn mode(&self) -> QuizMode {
        self.session.lock().await.mode().clone()
    }

    pub async fn current_index(&self) -> usize {
        self.session.lock().await.current_index()
    }

    pub async fn current_question(&self) -> Option<Question> {
        self.session.lock().await.current_question().cloned()
    }

    pub async fn remaining_seconds(&self) -> Option<u32> {
        self.session.lock().await.remaining_seconds()
    }

    /// 会话快照（用于界面展示）
    pub async fn snapshot(&self) -> QuizSession {
        self.session.lock().await.clone()
    }

    pub async fn answer(&self, index: usize, choice: usize) -> Result<(), SessionError> {
        self.session.lock().await.answer(index, choice)
    }

    pub async fn answer_current(&self, choice: usize) -> Result<(), SessionError> {
        self.session.lock().await.answer_current(choice)
    }

    /// 下一题；最后一题时交卷并停止倒计时
    pub async fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        let outcome = self.session.lock().await.advance(now)?;
        if matches!(outcome, Advance::Finished(_)) {
            self.stop_countdown();
        }
        Ok(outcome)
    }

    pub async fn retreat(&self) -> Result<usize, SessionError> {
        self.session.lock().await.retreat()
    }

    /// 手动交卷（包括练习中途提前结束）
    pub async fn submit(&mut self, now: DateTime<Utc>) -> Result<QuizResult, SessionError> {
        let result = self.session.lock().await.finish(false, now)?;
        self.stop_countdown();
        Ok(result)
    }

    /// 非阻塞地查看是否已超时交卷
    pub fn try_take_expired(&mut self) -> Option<QuizResult> {
        let rx = self.expired.as_mut()?;
        match rx.try_recv() {
            Ok(result) => {
                self.expired = None;
                self.countdown = None;
                Some(result)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.expired = None;
                None
            }
        }
    }

    /// 等待超时交卷；没有倒计时或已被手动交卷时返回 None
    pub async fn wait_for_timeout(&mut self) -> Option<QuizResult> {
        let rx = self.expired.take()?;
        let result = rx.await.ok();
        self.countdown = None;
        result
    }

    /// 已交卷的成绩（手动或超时）
    pub async fn finished_result(&self) -> Option<QuizResult> {
        self.session.lock().await.result().cloned()
    }

    /// 准备结束流程：已交卷（包括超时）则返回成绩，否则在会话锁内撤掉倒计时
    ///
    /// 之后即使计时任务还在排队，也不会再产生自动交卷
    pub async fn settle(&mut self) -> Option<QuizResult> {
        let finished = {
            let mut session = self.session.lock().await;
            let finished = session.result().cloned();
            if finished.is_none() {
                session.disarm_countdown();
            }
            finished
        };
        self.stop_countdown();
        self.expired = None;
        finished
    }

    /// 放弃答题，不产生成绩
    pub fn abandon(mut self) {
        self.stop_countdown();
        info!("答题已放弃");
    }
}
