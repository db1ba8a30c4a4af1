// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 指标（metrics）：抓取过程的计数器
/// - 存储（storage）：提供领域存储接口的文件系统与内存实现
/// - 车型列表（unit_list）：读取并校验输入的车型列表
pub mod metrics;
pub mod storage;
pub mod unit_list;
