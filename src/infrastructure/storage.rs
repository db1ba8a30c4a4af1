// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use crate::utils::errors::BatchError;

/// 汇总产物的文件键
pub const AGGREGATE_KEY: &str = "all_cars_info.json";

/// 准备输出目录
///
/// 未配置时使用当前本地时间（精确到分钟）命名，目录不存在则创建
pub fn prepare_output_dir(configured: Option<&str>) -> Result<PathBuf, BatchError> {
    let path = match configured {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(chrono::Local::now().format("%Y%m%d%H%M").to_string()),
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).map_err(|source| BatchError::OutputDir {
            path: path.clone(),
            source,
        })?;
        info!("Created output directory: {}", path.display());
    } else if !path.is_dir() {
        return Err(BatchError::OutputDir {
            source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "not a directory"),
            path,
        });
    }

    Ok(path)
}

/// 本地文件系统存储实现
///
/// 以缩进格式的 UTF-8 JSON 写入 `<base_path>/<key>`
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn get_full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl StorageRepository for LocalStorage {
    async fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let full_path = self.get_full_path(key);
        let data = serde_json::to_vec_pretty(value)?;

        // 确保目录存在
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        info!("Saved {}", full_path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let full_path = self.get_full_path(key);

        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get_full_path(key).exists())
    }
}

/// 测试用的内存存储实现（用于单元测试）
///
/// 可以指定某些键写入失败，用于验证持久化失败不会中断批处理
#[derive(Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, Value>>>,
    failing_keys: Vec<String>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入这些键时返回错误
    pub fn failing_on(keys: &[&str]) -> Self {
        Self {
            data: Arc::default(),
            failing_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StorageRepository for InMemoryStorage {
    async fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        if self.failing_keys.iter().any(|k| k == key) {
            return Err(StorageError::Other(format!("write rejected for {}", key)));
        }
        let mut map = self.data.write().await;
        map.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let map = self.data.read().await;
        Ok(map.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let map = self.data.read().await;
        Ok(map.contains_key(key))
    }
}
