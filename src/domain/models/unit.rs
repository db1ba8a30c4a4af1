// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 未提供品牌名称时使用的占位名
pub const UNKNOWN_BRAND: &str = "未知品牌";
/// 未提供车型名称时使用的占位名
pub const UNKNOWN_MODEL: &str = "未知车型";

/// 抓取单元
///
/// 一个 (品牌, 车型, URL) 工作项。身份由 (品牌, 车型) 决定，
/// 同一单元在成功或重试耗尽之前可能被多次尝试。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// 品牌
    pub brand: String,
    /// 车型
    pub model: String,
    /// 参数对比页地址
    pub url: String,
}

impl Unit {
    pub fn new(brand: impl Into<String>, model: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            url: url.into(),
        }
    }

    /// 单元身份
    pub fn identity(&self) -> (&str, &str) {
        (&self.brand, &self.model)
    }

    /// 单元产物的文件键：`<品牌>_<车型>.json`
    ///
    /// 路径分隔符会被替换，保证产物始终落在输出目录内
    pub fn artifact_key(&self) -> String {
        format!(
            "{}_{}.json",
            sanitize_component(&self.brand),
            sanitize_component(&self.model)
        )
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.brand, self.model)
    }
}

fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}
