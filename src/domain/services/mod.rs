// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含抓取流水线的各个阶段：
/// - 就绪检测（readiness_detector）：判断页面何时可以抽取
/// - 列结构提取（column_schema）：发现对比列
/// - 参数映射（attribute_mapper）：抽取参数行并对齐到列
/// - 结果汇总（aggregator）：合并各车型结果
pub mod aggregator;
pub mod attribute_mapper;
pub mod column_schema;
pub mod readiness_detector;
