// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::column_set::ColumnSet;
use crate::engines::strategy::StrategyChain;
use crate::engines::traits::{PageHandle, Scope};
use crate::utils::errors::ScrapeError;
use tracing::{debug, warn};

/// 列结构提取器
///
/// 通过列头策略链发现页面上的对比列
#[derive(Debug)]
pub struct ColumnSchemaExtractor {
    chain: StrategyChain,
}

impl ColumnSchemaExtractor {
    pub fn new(chain: StrategyChain) -> Self {
        Self { chain }
    }

    pub fn from_selectors<S: AsRef<str>>(selectors: &[S]) -> Self {
        Self::new(StrategyChain::from_selectors("columns", selectors))
    }

    /// 提取列集合
    ///
    /// 单个列头文本读取失败时该列使用占位名；
    /// 所有策略都没有匹配时返回 `ScrapeError::SchemaEmpty`
    pub async fn extract(&self, page: &dyn PageHandle) -> Result<ColumnSet, ScrapeError> {
        let Some(located) = self.chain.locate_first(Scope::Page(page)).await? else {
            return Err(ScrapeError::SchemaEmpty);
        };

        let mut labels = Vec::with_capacity(located.elements.len());
        for (index, element) in located.elements.iter().enumerate() {
            match element.text().await {
                Ok(text) => labels.push(Some(text)),
                Err(e) => {
                    warn!(column = index + 1, "Failed to read column label: {}", e);
                    labels.push(None);
                }
            }
        }

        let columns = ColumnSet::from_raw_labels(labels);
        debug!(
            strategy = located.strategy.as_str(),
            count = columns.len(),
            "Columns discovered"
        );
        Ok(columns)
    }
}
