// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::column_set::ColumnSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 表示"无数据"的占位取值，不写入结果
pub const PLACEHOLDER_VALUES: [&str; 4] = ["——", "/", "空", "N/A"];

/// 判断取值是否为占位符
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_VALUES.contains(&value)
}

/// 一行参数：参数名及按位置排列的取值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRow {
    pub label: String,
    pub values: Vec<String>,
}

impl AttributeRow {
    pub fn new(label: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// 单个车型页面的抽取结果：列 → 参数名 → 取值
///
/// 写入时执行清洗，因此结果中不存在空参数名、空取值或占位取值。
/// 由列集合创建时每一列都会出现，没有有效取值的列序列化为 `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    columns: BTreeMap<String, BTreeMap<String, String>>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为每个发现的列预留一个空映射
    pub fn with_columns(columns: &ColumnSet) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|column| (column.to_string(), BTreeMap::new()))
                .collect(),
        }
    }

    /// 清洗后写入一个 (参数名, 取值) 对，返回是否写入
    pub fn insert(&mut self, column: &str, label: &str, value: &str) -> bool {
        if label.is_empty() || value.is_empty() || is_placeholder(value) {
            return false;
        }
        self.columns
            .entry(column.to_string())
            .or_default()
            .insert(label.to_string(), value.to_string());
        true
    }

    pub fn get(&self, column: &str, label: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|attrs| attrs.get(label))
            .map(String::as_str)
    }

    pub fn column(&self, column: &str) -> Option<&BTreeMap<String, String>> {
        self.columns.get(column)
    }

    /// 结果中的所有列
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// 所有 (列, 参数名, 取值)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.columns.iter().flat_map(|(column, attrs)| {
            attrs
                .iter()
                .map(move |(label, value)| (column.as_str(), label.as_str(), value.as_str()))
        })
    }

    /// 已写入的 (参数名, 取值) 对总数
    pub fn pair_count(&self) -> usize {
        self.columns.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pair_count() == 0
    }
}

/// 列数与取值数不一致的行诊断
///
/// 此时按位置截断对齐，多出的列或取值被丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentMismatch {
    /// 参数名
    pub label: String,
    /// 页面列数
    pub expected: usize,
    /// 该行取值单元格数
    pub found: usize,
}

impl fmt::Display for AlignmentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row \"{}\" has {} value cells for {} columns",
            self.label, self.found, self.expected
        )
    }
}

/// 一次抽取尝试的报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub result: ExtractionResult,
    pub mismatches: Vec<AlignmentMismatch>,
    /// 处理的参数行数
    pub rows_seen: usize,
    /// 因缺少参数名或读取失败而跳过的行数
    pub rows_skipped: usize,
    /// 被清洗规则丢弃的取值数
    pub pairs_discarded: usize,
}
