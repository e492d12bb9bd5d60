//! 考试倒计时
//!
//! 每秒对共享会话调用一次 `tick`，时间到时通过 oneshot 送出自动交卷的成绩。
//! 计时任务由持有它的流程管理：取消或 drop 时立即中止

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

use crate::models::QuizResult;
use crate::workflow::session::{QuizSession, Tick};

/// 多个任务共享的答题会话
pub type SharedSession = Arc<Mutex<QuizSession>>;

/// 倒计时任务句柄
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// 启动倒计时，第一次 tick 在一秒之后
    ///
    /// # 返回
    /// 返回任务句柄和接收自动交卷成绩的通道
    pub fn spawn(session: SharedSession) -> (Self, oneshot::Receiver<QuizResult>) {
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);

            loop {
                ticker.tick().await;

                let outcome = session.lock().await.tick(Utc::now());
                match outcome {
                    Tick::Remaining(seconds) => {
                        if seconds % 60 == 0 {
                            info!("⏱ 剩余 {} 分钟", seconds / 60);
                        } else {
                            debug!("剩余 {} 秒", seconds);
                        }
                    }
                    Tick::Expired(result) => {
                        info!("⏰ 时间到，自动交卷");
                        let _ = tx.send(result);
                        break;
                    }
                    Tick::Idle => {
                        debug!("会话已不在进行中，倒计时退出");
                        break;
                    }
                }
            }
        });

        (Self { handle }, rx)
    }

    /// 停止倒计时
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
