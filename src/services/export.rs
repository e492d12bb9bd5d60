//! 成绩导出服务
//!
//! 只负责把成绩集合写成 CSV，没有导入

use std::path::Path;

use chrono::Local;
use tracing::info;

use crate::error::{AppResult, StoreError};
use crate::models::QuizResult;

const HEADER: [&str; 5] = ["student_name", "class", "score", "label", "timestamp"];

fn export_failed(path: &str, reason: impl ToString) -> StoreError {
    StoreError::ExportFailed {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// 生成 CSV 文本，时间为本地时间
pub fn results_to_csv(results: &[QuizResult]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| export_failed("<memory>", e))?;

    for r in results {
        let timestamp = r
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let score = format!("{:.1}", r.score);
        writer
            .write_record([
                r.student_name.as_str(),
                r.class_name.as_str(),
                score.as_str(),
                r.label.as_str(),
                timestamp.as_str(),
            ])
            .map_err(|e| export_failed("<memory>", e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| export_failed("<memory>", e))?;
    String::from_utf8(bytes).map_err(|e| export_failed("<memory>", e).into())
}

/// 导出到文件
pub async fn export_to_file(results: &[QuizResult], path: &Path) -> AppResult<()> {
    let csv = results_to_csv(results)?;
    tokio::fs::write(path, csv)
        .await
        .map_err(|e| export_failed(&path.display().to_string(), e))?;
    info!("✓ 已导出 {} 条成绩: {}", results.len(), path.display());
    Ok(())
}
