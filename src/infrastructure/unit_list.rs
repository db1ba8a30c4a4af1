// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::unit::{Unit, UNKNOWN_BRAND, UNKNOWN_MODEL};
use crate::utils::errors::BatchError;
use serde::Deserialize;
use std::path::Path;
use tracing::{error, info};
use url::Url;

/// 车型列表中的一条记录
#[derive(Debug, Clone, Deserialize)]
pub struct UnitDescriptor {
    /// 参数对比页地址
    pub url: Option<String>,
    /// 品牌
    pub name: Option<String>,
    /// 车型
    pub subname: Option<String>,
}

impl UnitDescriptor {
    /// 转换为抓取单元；地址缺失或不是 http/https 绝对地址时返回原因
    pub fn into_unit(self) -> Result<Unit, String> {
        let raw = self.url.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err("missing url".to_string());
        }
        let parsed = Url::parse(raw).map_err(|e| format!("invalid url `{}`: {}", raw, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme `{}`", parsed.scheme()));
        }

        Ok(Unit::new(
            name_or(self.name, UNKNOWN_BRAND),
            name_or(self.subname, UNKNOWN_MODEL),
            raw,
        ))
    }
}

fn name_or(name: Option<String>, default: &str) -> String {
    match name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => n,
        _ => default.to_string(),
    }
}

/// 加载后的车型列表
#[derive(Debug, Clone, Default)]
pub struct LoadedUnits {
    pub units: Vec<Unit>,
    /// 因缺少可用地址而跳过的记录数
    pub skipped: usize,
}

/// 解析车型列表 JSON
pub fn parse_units(path: &Path, content: &str) -> Result<LoadedUnits, BatchError> {
    let descriptors: Vec<UnitDescriptor> =
        serde_json::from_str(content).map_err(|source| BatchError::UnitListParse {
            path: path.to_path_buf(),
            source,
        })?;
    if descriptors.is_empty() {
        return Err(BatchError::EmptyUnitList);
    }

    let mut loaded = LoadedUnits::default();
    for (index, descriptor) in descriptors.into_iter().enumerate() {
        match descriptor.into_unit() {
            Ok(unit) => loaded.units.push(unit),
            Err(reason) => {
                error!(record = index, "Skipping unit list record: {}", reason);
                loaded.skipped += 1;
            }
        }
    }

    Ok(loaded)
}

/// 读取并解析车型列表文件
///
/// 文件不可读、格式错误或为空数组时返回致命错误
pub async fn load_units(path: impl AsRef<Path>) -> Result<LoadedUnits, BatchError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BatchError::UnitListRead {
            path: path.to_path_buf(),
            source,
        })?;

    let loaded = parse_units(path, &content)?;
    info!(
        path = %path.display(),
        units = loaded.units.len(),
        skipped = loaded.skipped,
        "Unit list loaded"
    );
    Ok(loaded)
}
