// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::models::dataset::AggregateDataset;
use crate::domain::models::extraction::ExtractionResult;
use crate::domain::models::unit::Unit;
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use crate::domain::services::aggregator::Aggregator;
use crate::engines::traits::BrowserSession;
use crate::infrastructure::metrics;
use crate::infrastructure::storage::AGGREGATE_KEY;
use crate::workers::unit_worker::{UnitOutcome, UnitWorker};

/// 批处理统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub exhausted: usize,
    /// 车型列表中因缺少可用地址而跳过的记录
    pub skipped: usize,
    /// 单车型产物写入失败次数
    pub persist_failures: usize,
}

impl BatchReport {
    pub fn log_summary(&self) {
        info!(
            total = self.total,
            succeeded = self.succeeded,
            exhausted = self.exhausted,
            skipped = self.skipped,
            persist_failures = self.persist_failures,
            "Batch finished"
        );
    }
}

/// 批处理输出
#[derive(Debug)]
pub struct BatchOutput {
    pub dataset: AggregateDataset,
    pub report: BatchReport,
    /// 按输入顺序排列的单元结果
    pub outcomes: Vec<UnitOutcome>,
}

/// 批处理执行器
///
/// 逐个（或以有限并发）处理车型，单个车型失败不影响其他车型
pub struct BatchRunner {
    worker: UnitWorker,
    storage: Arc<dyn StorageRepository>,
    workers: usize,
}

impl BatchRunner {
    pub fn new(worker: UnitWorker, storage: Arc<dyn StorageRepository>) -> Self {
        Self {
            worker,
            storage,
            workers: 1,
        }
    }

    /// 设置同时处理的车型数量
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// 处理所有车型并汇总结果
    ///
    /// 成功的车型立即写出单独的产物；汇总按输入顺序进行，
    /// 与完成顺序无关
    pub async fn run(&self, session: &dyn BrowserSession, units: &[Unit]) -> BatchOutput {
        info!(
            units = units.len(),
            workers = self.workers,
            session = session.name(),
            "Starting batch"
        );

        let mut completed: Vec<(usize, UnitOutcome, bool)> = stream::iter(units.iter().enumerate())
            .map(|(index, unit)| async move {
                let outcome = self.worker.process(session, unit).await;
                let persisted = match &outcome.result {
                    Some(result) => self.persist_unit(unit, result).await,
                    None => true,
                };
                (index, outcome, persisted)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        completed.sort_by_key(|(index, _, _)| *index);

        let mut report = BatchReport {
            total: units.len(),
            ..Default::default()
        };
        let mut aggregator = Aggregator::new();
        let mut outcomes = Vec::with_capacity(completed.len());
        for (_, outcome, persisted) in completed {
            if !persisted {
                report.persist_failures += 1;
            }
            match &outcome.result {
                Some(result) => {
                    report.succeeded += 1;
                    aggregator.insert(&outcome.unit, result.clone());
                }
                None => report.exhausted += 1,
            }
            outcomes.push(outcome);
        }

        BatchOutput {
            dataset: aggregator.finish(),
            report,
            outcomes,
        }
    }

    /// 在会话上执行批处理，结束后关闭会话并写出汇总产物
    ///
    /// 会话在写出汇总产物之前关闭，且只关闭一次
    pub async fn run_with_session(
        &self,
        session: Box<dyn BrowserSession>,
        units: &[Unit],
    ) -> Result<BatchOutput, StorageError> {
        let output = self.run(session.as_ref(), units).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        let value = serde_json::to_value(&output.dataset)?;
        self.storage.write(AGGREGATE_KEY, &value).await?;
        info!(entries = output.dataset.len(), "Aggregate dataset written");

        Ok(output)
    }

    async fn persist_unit(&self, unit: &Unit, result: &ExtractionResult) -> bool {
        let key = unit.artifact_key();
        let written = match serde_json::to_value(result) {
            Ok(value) => self.storage.write(&key, &value).await,
            Err(e) => Err(StorageError::from(e)),
        };
        match written {
            Ok(()) => true,
            Err(e) => {
                error!(unit = %unit, key = key.as_str(), "Failed to write unit artifact: {}", e);
                metrics::record_persist_failure();
                false
            }
        }
    }
}
