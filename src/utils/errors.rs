// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{FetchError, PageError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 单次抓取尝试所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Detecting,
    Extracting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Detecting => "detecting",
            Stage::Extracting => "extracting",
        };
        f.write_str(name)
    }
}

/// 抓取尝试失败的原因
///
/// 所有变体都会让编排器进入 `Failed` 状态并整体重试
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// 导航或页面稳定等待失败
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// 没有任何已知结构标记出现
    #[error("No readiness marker became visible ({tried} selectors tried)")]
    ReadinessTimeout { tried: usize },

    /// 所有列头选择器都没有匹配
    #[error("No comparison columns found")]
    SchemaEmpty,

    /// 没有参数行，或清洗后没有任何有效取值
    #[error("No attribute data extracted: {0}")]
    ExtractionEmpty(String),

    /// 页面查询过程中的意外故障
    #[error("Page fault: {0}")]
    Page(#[from] PageError),

    /// 抓取过程中的意外崩溃
    #[error("Unexpected fault: {0}")]
    Fault(String),
}

/// 批处理开始前的致命错误
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("无法读取车型列表 {path}: {source}")]
    UnitListRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("车型列表格式错误 {path}: {source}")]
    UnitListParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("车型列表为空")]
    EmptyUnitList,

    #[error("无法创建输出目录 {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
