use anyhow::Result;
use tracing::{info, warn};

use pe_quiz::services::GradeBand;
use pe_quiz::utils::logging;
use pe_quiz::{Config, FileStore, LlmService, QuizApp};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init_with_verbose(config.verbose_logging);

    if !config.llm_enabled() {
        warn!("⚠️ 未设置 LLM_API_KEY，AI 出题不可用");
    }

    // 打开存储并初始化应用
    let store = FileStore::open(&config.store_dir)?;
    let generator = LlmService::new(&config);
    let mut app = QuizApp::initialize(config, store, generator).await?;

    // 输出排行榜
    info!("🏆 排行榜");
    for (i, r) in app.ranking().iter().enumerate() {
        info!(
            "{:>2}. {} ({}) {:.1} 分 [{}] {}",
            i + 1,
            r.student_name,
            r.class_name,
            r.score,
            GradeBand::from_score(r.score),
            r.label
        );
    }

    // 导出成绩（以管理员身份）
    let admin_password = app.config().default_admin_password.clone();
    let logged_in = app.login("admin", &admin_password).await.map(|_| ());
    let export_path = match logged_in {
        Ok(()) => app.export_csv().await?.display().to_string(),
        Err(e) => {
            warn!("管理员登录失败，跳过导出: {}", e);
            String::from("-")
        }
    };
    app.logout().await?;

    let repo = app.repository();
    logging::print_final_stats(repo.users().len(), repo.results().len(), &export_path);

    Ok(())
}
