pub mod logging;

use chrono::{DateTime, Utc};
use rand::Rng;

/// 生成记录 ID：毫秒时间戳 + 4 位随机数
pub fn new_id(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{}-{:04}", prefix, now.timestamp_millis(), suffix)
}
