/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 数据目录（每个键一个 JSON 文件）
    pub store_dir: String,
    /// 成绩导出文件
    pub export_path: String,
    /// 首次启动时的管理员密码
    pub default_admin_password: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 额外题库 TOML 文件（与内置题库合并）
    pub extra_question_bank: Option<String>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: "pe_data".to_string(),
            export_path: "ket_qua_the_duc.csv".to_string(),
            default_admin_password: "admin".to_string(),
            verbose_logging: false,
            extra_question_bank: None,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            store_dir: std::env::var("STORE_DIR").unwrap_or(default.store_dir),
            export_path: std::env::var("EXPORT_PATH").unwrap_or(default.export_path),
            default_admin_password: std::env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or(default.default_admin_password),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            extra_question_bank: std::env::var("EXTRA_QUESTION_BANK").ok().filter(|p| !p.is_empty()),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// LLM 是否可用
    pub fn llm_enabled(&self) -> bool {
        !self.llm_api_key.is_empty()
    }
}
