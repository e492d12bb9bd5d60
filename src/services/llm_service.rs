//! LLM 出题服务 - 业务能力层
//!
//! 只负责"让 LLM 出题 / 写评语"能力，不关心答题流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::{FunQuestion, FunTaskResult, Grade, Question};
use crate::utils::logging::truncate_text;

/// 默认的系统提示词
pub const SYSTEM_INSTRUCTION: &str = "Bạn là một chuyên gia giáo dục thể chất cho học sinh tiểu học tại Việt Nam. \
Nhiệm vụ của bạn là tạo ra các câu hỏi trắc nghiệm ôn tập kiến thức GDTC theo chương trình hiện hành. \
Câu hỏi phải phù hợp với tâm lý lứa tuổi tiểu học, ngôn ngữ trong sáng, dễ hiểu. \
Mỗi câu hỏi có 4 phương án lựa chọn, trong đó chỉ có 1 phương án đúng.";

/// 趣味小测验的题目数量
pub const FUN_QUESTION_COUNT: usize = 15;

/// 评语生成失败时的兜底文字
pub const FALLBACK_ASSESSMENT: &str =
    "Bé đã hoàn thành bài tập rất tốt! Hãy tiếp tục rèn luyện sức khỏe nhé.";

/// 出题请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub count: usize,
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, count: usize) -> Self {
        Self {
            topic: topic.into(),
            count,
            system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
        }
    }
}

/// 出题能力
///
/// 失败时返回错误，调用方保持原有状态不变
#[allow(async_fn_in_trait)]
pub trait QuestionGenerator {
    /// 生成选择题
    async fn generate_questions(&self, request: &GenerationRequest) -> AppResult<Vec<Question>>;

    /// 生成趣味小测验题目
    async fn generate_fun_questions(&self, grade: Grade) -> AppResult<Vec<FunQuestion>>;

    /// 根据趣味小测验结果写一段老师评语
    async fn assess_fun_results(&self, results: &[FunTaskResult], grade: Grade) -> AppResult<String>;
}

/// LLM 返回的题目结构
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
    text: String,
    options: Vec<String>,
    correct_index: usize,
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成题目和评语
/// - 解析并校验返回的 JSON
/// - 不接触存储，不关心答题会话
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

impl QuestionGenerator for LlmService {
    async fn generate_questions(&self, request: &GenerationRequest) -> AppResult<Vec<Question>> {
        let user_message = build_question_prompt(request);
        let response = self
            .send_to_llm(&user_message, request.system_instruction.as_deref())
            .await?;
        let questions = parse_generated_questions(&response, &request.topic)?;
        debug!("LLM 生成 {} 道题目: {}", questions.len(), request.topic);
        Ok(questions)
    }

    async fn generate_fun_questions(&self, grade: Grade) -> AppResult<Vec<FunQuestion>> {
        let response = self.send_to_llm(&build_fun_prompt(grade), None).await?;
        parse_fun_questions(&response)
    }

    async fn assess_fun_results(&self, results: &[FunTaskResult], grade: Grade) -> AppResult<String> {
        let results_json = serde_json::to_string(results).unwrap_or_default();
        let user_message = format!(
            "Dựa trên kết quả bài kiểm tra thể chất lớp {} (tổng cộng {} câu) sau: {}. \
             Hãy đưa ra một bản nhận xét ngắn gọn (khoảng 2-3 câu), khích lệ bé như một giáo viên thể dục tận tâm.",
            grade,
            FUN_QUESTION_COUNT,
            results_json
        );
        self.send_to_llm(&user_message, None).await
    }
}

/// 构建出题提示词
fn build_question_prompt(request: &GenerationRequest) -> String {
    format!(
        r#"Hãy tạo {} câu hỏi trắc nghiệm về chủ đề "{}" cho học sinh tiểu học.

Chỉ trả về một mảng JSON, mỗi phần tử có dạng:
{{"text": "nội dung câu hỏi", "options": ["A", "B", "C", "D"], "correctIndex": 0}}
Trong đó "options" có đúng 4 phương án và "correctIndex" là chỉ số (0-3) của đáp án đúng."#,
        request.count, request.topic
    )
}

/// 构建趣味小测验提示词
fn build_fun_prompt(grade: Grade) -> String {
    format!(
        r#"Tạo đúng {} câu hỏi kiểm tra năng lực thể chất cho học sinh Lớp {}.
Hãy phân bổ đa dạng các chủ đề phù hợp với lứa tuổi:
1. Tư thế và kỹ năng vận động cơ bản;
2. Vệ sinh sân tập và thân thể;
3. Nhận biết các loại bóng và dụng cụ thể thao;
4. Các bài tập thể dục nhịp điệu hoặc trò chơi vận động.
Hãy trộn lẫn các loại câu hỏi: KNOWLEDGE (Kiến thức - Trắc nghiệm), ACTION (Hành động - Yêu cầu bé làm theo và có thời gian đếm ngược), IDENTIFY (Nhận biết hình ảnh/dụng cụ).
Chỉ trả về một mảng JSON, mỗi phần tử gồm: id (số nguyên), type, title, instruction, options (mảng chuỗi, nếu có), correctAnswer (chuỗi, nếu có), duration (số giây, chỉ dành cho ACTION), imageHint."#,
        FUN_QUESTION_COUNT, grade
    )
}

/// 从 LLM 响应中取出 JSON 数组（去掉代码块标记和多余文字）
fn extract_json_array(response: &str) -> &str {
    match Regex::new(r"(?s)\[.*\]") {
        Ok(re) => re.find(response).map_or(response, |m| m.as_str()),
        Err(_) => response,
    }
}

/// 解析并校验 LLM 生成的选择题
pub fn parse_generated_questions(response: &str, topic: &str) -> AppResult<Vec<Question>> {
    let json = extract_json_array(response);
    let generated: Vec<GeneratedQuestion> =
        serde_json::from_str(json).map_err(|source| LlmError::MalformedPayload {
            response: truncate_text(response, 200),
            source,
        })?;

    if generated.is_empty() {
        return Err(LlmError::NoQuestions.into());
    }

    generated
        .into_iter()
        .enumerate()
        .map(|(i, g)| {
            let question = Question::new(format!("ai-{}", i + 1), g.text, g.options, g.correct_index)
                .with_topic(topic);
            question
                .validate()
                .map_err(|reason| LlmError::InvalidQuestion {
                    position: i + 1,
                    reason,
                })?;
            Ok(question)
        })
        .collect()
}

/// 解析 LLM 生成的趣味题
pub fn parse_fun_questions(response: &str) -> AppResult<Vec<FunQuestion>> {
    let json = extract_json_array(response);
    let questions: Vec<FunQuestion> =
        serde_json::from_str(json).map_err(|source| LlmError::MalformedPayload {
            response: truncate_text(response, 200),
            source,
        })?;

    if questions.is_empty() {
        return Err(LlmError::NoQuestions.into());
    }
    Ok(questions)
}
