// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、抓取流水线服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 页面自动化接口，以及 Chromium 与静态快照两种实现
pub mod engines;

/// 基础设施模块
///
/// 提供存储、车型列表读取和指标
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型、重试策略和日志初始化
pub mod utils;

/// 工作器模块
///
/// 单车型重试状态机与批处理执行
pub mod workers;
