// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extraction::ExtractionResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// 批次汇总数据集：品牌 → 车型 → 抽取结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregateDataset {
    brands: BTreeMap<String, BTreeMap<String, ExtractionResult>>,
}

impl AggregateDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个车型的结果，品牌映射按需创建；返回被覆盖的旧结果
    pub fn insert(
        &mut self,
        brand: &str,
        model: &str,
        result: ExtractionResult,
    ) -> Option<ExtractionResult> {
        self.brands
            .entry(brand.to_string())
            .or_default()
            .insert(model.to_string(), result)
    }

    pub fn get(&self, brand: &str, model: &str) -> Option<&ExtractionResult> {
        self.brands.get(brand).and_then(|models| models.get(model))
    }

    pub fn contains(&self, brand: &str, model: &str) -> bool {
        self.get(brand, model).is_some()
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.brands.keys().map(String::as_str)
    }

    /// 车型条目总数
    pub fn len(&self) -> usize {
        self.brands.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
