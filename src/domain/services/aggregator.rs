// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::dataset::AggregateDataset;
use crate::domain::models::extraction::ExtractionResult;
use crate::domain::models::unit::Unit;
use tracing::warn;

/// 结果汇总器
///
/// 收集各车型的抽取结果，批次结束后通过 `finish` 交出数据集
#[derive(Debug, Default)]
pub struct Aggregator {
    dataset: AggregateDataset,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个车型的结果；同一 (品牌, 车型) 后写覆盖先写
    pub fn insert(&mut self, unit: &Unit, result: ExtractionResult) {
        if self
            .dataset
            .insert(&unit.brand, &unit.model, result)
            .is_some()
        {
            warn!(
                brand = unit.brand.as_str(),
                model = unit.model.as_str(),
                "Duplicate unit, previous result overwritten"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn finish(self) -> AggregateDataset {
        self.dataset
    }
}
