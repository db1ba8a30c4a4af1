// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：抓取单元、列集合、抽取结果和汇总数据集
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：抓取流水线的各个阶段
///
/// 领域层只依赖页面自动化接口，不依赖具体的浏览器实现。
pub mod models;
pub mod repositories;
pub mod services;
