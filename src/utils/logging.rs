/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志，`RUST_LOG` 未设置时默认 info；重复调用不会报错
pub fn init() {
    init_with_verbose(false);
}

/// 初始化日志，verbose 时默认级别为 debug
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `store_dir`: 存储目录
/// - `question_count`: 内置题目数量
pub fn log_startup(store_dir: &str, question_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🏃 体育测验程序启动");
    info!("📁 存储目录: {}", store_dir);
    info!("📚 内置题目: {} 道", question_count);
    info!("{}", "=".repeat(60));
}

/// 记录答题开始信息
pub fn log_session_start(student: &str, label: &str, total: usize, seconds: Option<u32>) {
    info!("\n{}", "─".repeat(60));
    info!("📝 {} 开始答题: {}", student, label);
    match seconds {
        Some(s) => info!("📄 共 {} 题，限时 {} 秒", total, s),
        None => info!("📄 共 {} 题，不限时", total),
    }
    info!("{}", "─".repeat(60));
}

/// 记录交卷信息
pub fn log_session_finished(student: &str, score: f64, correct: usize, total: usize, auto: bool) {
    info!("\n{}", "─".repeat(60));
    if auto {
        info!("⏰ 时间到，{} 自动交卷", student);
    } else {
        info!("✓ {} 交卷", student);
    }
    info!("📊 得分: {:.1} / 10（答对 {}/{}）", score, correct, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `users`: 用户数量
/// - `results`: 成绩数量
/// - `export_path`: 导出文件路径
pub fn print_final_stats(users: usize, results: usize, export_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 数据统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("👤 用户: {}", users);
    info!("📝 成绩: {}", results);
    info!("{}", "=".repeat(60));
    info!("\n成绩已导出至: {}", export_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
