// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供单个车型的重试状态机和批处理执行
pub mod batch_runner;
pub mod unit_worker;

pub use batch_runner::{BatchOutput, BatchReport, BatchRunner};
pub use unit_worker::{UnitOutcome, UnitState, UnitWorker};
