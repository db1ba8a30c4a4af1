// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SelectorSettings;
use crate::domain::models::column_set::ColumnSet;
use crate::domain::models::extraction::{
    AlignmentMismatch, AttributeRow, ExtractionReport, ExtractionResult,
};
use crate::engines::strategy::StrategyChain;
use crate::engines::traits::{ElementHandle, PageError, PageHandle, Scope};
use crate::infrastructure::metrics;
use crate::utils::errors::ScrapeError;
use tracing::{debug, warn};

/// 单行对齐结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowAlignment {
    /// 写入结果的 (参数名, 取值) 对数
    pub stored: usize,
    /// 被清洗规则丢弃的取值数
    pub discarded: usize,
    /// 列数与取值数不一致时的诊断
    pub mismatch: Option<AlignmentMismatch>,
}

/// 将一行取值按位置对齐到列上
///
/// 数量不一致时只对齐前 min(取值数, 列数) 个，多余部分丢弃
pub fn align_row(
    result: &mut ExtractionResult,
    columns: &ColumnSet,
    row: &AttributeRow,
) -> RowAlignment {
    let mut alignment = RowAlignment::default();

    if row.values.len() != columns.len() {
        alignment.mismatch = Some(AlignmentMismatch {
            label: row.label.clone(),
            expected: columns.len(),
            found: row.values.len(),
        });
    }

    for (column, value) in columns.iter().zip(&row.values) {
        if result.insert(column, &row.label, value) {
            alignment.stored += 1;
        } else {
            alignment.discarded += 1;
        }
    }

    alignment
}

/// 参数映射器
///
/// 抽取参数行并把取值对齐到列集合
#[derive(Debug)]
pub struct AttributeMapper {
    rows: StrategyChain,
    label: StrategyChain,
    values: StrategyChain,
}

impl AttributeMapper {
    pub fn new(rows: StrategyChain, label: StrategyChain, values: StrategyChain) -> Self {
        Self { rows, label, values }
    }

    pub fn from_settings(settings: &SelectorSettings) -> Self {
        Self::new(
            StrategyChain::from_selectors("rows", &settings.rows),
            StrategyChain::from_selectors("label", &settings.label),
            StrategyChain::from_selectors("values", &settings.values),
        )
    }

    /// 抽取所有参数行
    ///
    /// 单行读取失败只跳过该行；没有参数行或没有任何有效取值时
    /// 返回 `ScrapeError::ExtractionEmpty`
    pub async fn extract(
        &self,
        page: &dyn PageHandle,
        columns: &ColumnSet,
    ) -> Result<ExtractionReport, ScrapeError> {
        let Some(located) = self.rows.locate_first(Scope::Page(page)).await? else {
            return Err(ScrapeError::ExtractionEmpty(
                "no attribute rows found".to_string(),
            ));
        };
        debug!(
            strategy = located.strategy.as_str(),
            rows = located.elements.len(),
            "Attribute rows located"
        );

        let mut report = ExtractionReport {
            result: ExtractionResult::with_columns(columns),
            ..Default::default()
        };
        for (index, element) in located.elements.iter().enumerate() {
            report.rows_seen += 1;

            let row = match self.read_row(element.as_ref()).await {
                Ok(Some(row)) => row,
                Ok(None) => {
                    debug!(row = index, "Row has no label cell, skipping");
                    report.rows_skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(row = index, "Failed to read attribute row: {}", e);
                    report.rows_skipped += 1;
                    continue;
                }
            };

            let alignment = align_row(&mut report.result, columns, &row);
            report.pairs_discarded += alignment.discarded;
            if let Some(mismatch) = alignment.mismatch {
                warn!(
                    label = mismatch.label.as_str(),
                    expected = mismatch.expected,
                    found = mismatch.found,
                    "Value count does not match column count, truncating"
                );
                report.mismatches.push(mismatch);
            }
        }
        metrics::record_mismatches(report.mismatches.len());

        if report.result.is_empty() {
            return Err(ScrapeError::ExtractionEmpty(format!(
                "{} rows yielded no values",
                report.rows_seen
            )));
        }

        Ok(report)
    }

    async fn read_row(&self, row: &dyn ElementHandle) -> Result<Option<AttributeRow>, PageError> {
        let Some(label_cells) = self.label.locate_first(Scope::Element(row)).await? else {
            return Ok(None);
        };
        let label = match label_cells.elements.first() {
            Some(cell) => cell.text().await?.trim().to_string(),
            None => return Ok(None),
        };

        let mut values = Vec::new();
        if let Some(value_cells) = self.values.locate_first(Scope::Element(row)).await? {
            for cell in &value_cells.elements {
                values.push(cell.text().await?.trim().to_string());
            }
        }

        Ok(Some(AttributeRow::new(label, values)))
    }
}
