//! 键值存储 - 基础设施层
//!
//! 持有唯一的持久化资源，只暴露"按键读写字符串"的能力

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AppResult, StoreError};

/// 键值存储
///
/// 职责：
/// - 按键读写原始字符串
/// - 不认识 User / QuizResult
/// - 键不存在时返回 None 而不是错误
pub trait KvStore {
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    fn set(&mut self, key: &str, value: String) -> AppResult<()>;

    /// 读取并反序列化；键不存在或内容损坏时返回默认值
    fn get_json_or_default<T>(&self, key: &str) -> AppResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.get(key)? else {
            debug!("键 {} 不存在，使用默认值", key);
            return Ok(T::default());
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("键 {} 的内容已损坏，重置为默认值: {}", key, e);
                Ok(T::default())
            }
        }
    }

    /// 序列化后写入
    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::SerializeFailed {
            key: key.to_string(),
            source,
        })?;
        self.set(key, raw)
    }
}

/// 内存存储，用于测试和一次性会话
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> AppResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// 文件存储：每个键对应目录下的一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// 打开存储目录，不存在则创建
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::WriteFailed {
            key: dir.display().to_string(),
            source,
        })?;
        debug!("打开存储目录: {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::ReadFailed {
                key: key.to_string(),
                source,
            }
            .into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> AppResult<()> {
        fs::write(self.path_for(key), value).map_err(|source| {
            StoreError::WriteFailed {
                key: key.to_string(),
                source,
            }
            .into()
        })
    }
}
