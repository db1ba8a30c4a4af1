// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;

/// 对比列集合
///
/// 页面上每个对比目标（车型配置）对应一列。标识符两两不同且非空：
/// 原始标签为空或与前面的列重复时，替换为 `Column_<序号>` 占位名。
/// 每次抓取尝试都会重新构建。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<String>,
}

impl ColumnSet {
    /// 由原始标签构建列集合
    ///
    /// `None` 表示该列的文本读取失败，同样使用占位名
    pub fn from_raw_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();

        for (index, raw) in labels.into_iter().enumerate() {
            let label = raw.map(|l| l.trim().to_string()).unwrap_or_default();
            let id = if label.is_empty() || seen.contains(&label) {
                placeholder(index + 1, &seen)
            } else {
                label
            };
            seen.insert(id.clone());
            columns.push(id);
        }

        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.columns
    }
}

fn placeholder(ordinal: usize, taken: &HashSet<String>) -> String {
    let base = format!("Column_{}", ordinal);
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}
