use thiserror::Error;

use crate::models::{ExamStatus, Grade};

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 考试准入错误
    #[error("准入错误: {0}")]
    Admission(#[from] AdmissionError),
    /// 出题服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 答题会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
}

/// 输入校验错误
///
/// 操作直接中止，状态保持不变
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 必填字段为空
    #[error("字段 {field} 不能为空")]
    EmptyField { field: &'static str },
    /// 用户名已存在
    #[error("用户名 {username} 已存在")]
    DuplicateUsername { username: String },
    /// 两次输入的密码不一致
    #[error("两次输入的密码不一致")]
    PasswordMismatch,
    /// 用户名或密码错误
    #[error("用户名或密码错误")]
    InvalidCredentials,
    /// 用户不存在
    #[error("用户不存在: {user_id}")]
    UnknownUser { user_id: String },
    /// 开始时间不早于结束时间
    #[error("考试开始时间必须早于结束时间")]
    InvalidWindow,
    /// 考试时长为零
    #[error("考试时长必须大于 0 分钟")]
    ZeroDuration,
    /// 年级超出范围
    #[error("年级 {value} 超出范围 [1, 5]")]
    InvalidGrade { value: u8 },
    /// 选项数量错误
    #[error("题目必须有 {expected} 个选项，实际 {actual} 个")]
    OptionCount { expected: usize, actual: usize },
    /// 正确答案索引越界
    #[error("正确答案索引 {index} 超出范围 [0, {max_index}]")]
    CorrectIndexOutOfRange { index: usize, max_index: usize },
    /// 题目不存在
    #[error("题目不存在: {question_id}")]
    UnknownQuestion { question_id: String },
}

/// 考试准入错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// 考试当前不开放
    #[error("{grade} 年级考试当前状态为 {status}，无法进入")]
    NotOpen { grade: Grade, status: ExamStatus },
    /// 已参加过该年级的正式考试
    #[error("用户 {user_id} 已参加过 {grade} 年级的正式考试")]
    AlreadyAttempted { user_id: String, grade: Grade },
    /// 尚未登录
    #[error("请先登录")]
    NotLoggedIn,
    /// 没有权限
    #[error("{action} 需要管理员权限")]
    NotPermitted { action: &'static str },
}

/// 出题服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 返回内容无法解析
    #[error("无法解析LLM返回的题目 (响应: {response}): {source}")]
    MalformedPayload {
        response: String,
        #[source]
        source: serde_json::Error,
    },
    /// 返回的题目不合法
    #[error("LLM返回的第 {position} 道题不合法: {reason}")]
    InvalidQuestion { position: usize, reason: ValidationError },
    /// 返回的题目列表为空
    #[error("LLM没有返回任何题目")]
    NoQuestions,
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取失败
    #[error("读取键 {key} 失败: {source}")]
    ReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入键 {key} 失败: {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("序列化键 {key} 失败: {source}")]
    SerializeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// 导出失败
    #[error("导出失败 ({path}): {reason}")]
    ExportFailed { path: String, reason: String },
}

/// 答题会话错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 题目集合为空
    #[error("题目集合为空，请检查题库配置")]
    EmptyQuestionSet,
    /// 会话尚未开始
    #[error("会话尚未开始")]
    NotStarted,
    /// 会话已开始
    #[error("会话已经开始")]
    AlreadyStarted,
    /// 会话已结束
    #[error("会话已结束，不能再修改")]
    Finished,
    /// 题目索引越界
    #[error("题目索引 {index} 超出范围 [0, {max_index}]")]
    QuestionOutOfRange { index: usize, max_index: usize },
    /// 选项索引越界
    #[error("选项索引 {choice} 超出范围 [0, {max_index}]")]
    ChoiceOutOfRange { choice: usize, max_index: usize },
    /// 没有进行中的会话
    #[error("没有进行中的答题会话")]
    NoActiveSession,
    /// 动作题倒计时尚未结束
    #[error("动作题倒计时还剩 {remaining} 秒")]
    ActionInProgress { remaining: u32 },
    /// 当前题目类型不支持该操作
    #[error("当前题目类型不支持该操作")]
    WrongQuestionKind,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 界面上展示给用户的提示语
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(ValidationError::EmptyField { .. }) => {
                "Vui lòng nhập đầy đủ thông tin!".to_string()
            }
            AppError::Validation(ValidationError::DuplicateUsername { .. }) => {
                "Tên đăng nhập đã tồn tại!".to_string()
            }
            AppError::Validation(ValidationError::PasswordMismatch) => {
                "Mật khẩu xác nhận không khớp!".to_string()
            }
            AppError::Validation(ValidationError::InvalidCredentials) => {
                "Sai tên đăng nhập hoặc mật khẩu!".to_string()
            }
            AppError::Validation(ValidationError::InvalidWindow) => {
                "Thời gian bắt đầu phải trước thời gian kết thúc!".to_string()
            }
            AppError::Validation(_) => "Dữ liệu không hợp lệ, vui lòng kiểm tra lại!".to_string(),
            AppError::Admission(AdmissionError::AlreadyAttempted { .. }) => {
                "Bạn đã hoàn thành bài thi của khối lớp này rồi!".to_string()
            }
            AppError::Admission(AdmissionError::NotOpen { .. }) => {
                "Bài thi hiện chưa mở hoặc đã kết thúc!".to_string()
            }
            AppError::Admission(AdmissionError::NotLoggedIn) => {
                "Vui lòng đăng nhập trước!".to_string()
            }
            AppError::Admission(AdmissionError::NotPermitted { .. }) => {
                "Bạn không có quyền thực hiện thao tác này!".to_string()
            }
            AppError::Llm(_) => "Không thể tạo câu hỏi lúc này, vui lòng thử lại!".to_string(),
            AppError::Store(_) => "Không thể lưu dữ liệu, vui lòng thử lại!".to_string(),
            AppError::Session(_) => "Bài làm không hợp lệ, vui lòng bắt đầu lại!".to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_localized() {
        let err: AppError = ValidationError::PasswordMismatch.into();
        assert_eq!(err.user_message(), "Mật khẩu xác nhận không khớp!");

        let err: AppError = LlmError::NoQuestions.into();
        assert!(err.user_message().contains("thử lại"));
    }

    #[test]
    fn test_display_wraps_inner_error() {
        let err: AppError = SessionError::Finished.into();
        assert_eq!(err.to_string(), "会话错误: 会话已结束，不能再修改");
    }
}
