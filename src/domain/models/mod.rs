// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 抓取单元（unit）：一个 (品牌, 车型, URL) 工作项
/// - 对比列集合（column_set）：页面上发现的车型配置列
/// - 抽取结果（extraction）：列 → 参数 → 取值，以及对齐诊断
/// - 汇总数据集（dataset）：品牌 → 车型 → 抽取结果
pub mod column_set;
pub mod dataset;
pub mod extraction;
pub mod unit;

pub use column_set::ColumnSet;
pub use dataset::AggregateDataset;
pub use extraction::{AlignmentMismatch, AttributeRow, ExtractionReport, ExtractionResult};
pub use unit::Unit;
