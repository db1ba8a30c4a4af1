// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::settings::Settings;
use crate::domain::models::extraction::{AlignmentMismatch, ExtractionReport, ExtractionResult};
use crate::domain::models::unit::Unit;
use crate::domain::services::attribute_mapper::AttributeMapper;
use crate::domain::services::column_schema::ColumnSchemaExtractor;
use crate::domain::services::readiness_detector::ReadinessDetector;
use crate::engines::traits::{BrowserSession, PageHandle};
use crate::infrastructure::metrics;
use crate::utils::errors::{ScrapeError, Stage};
use crate::utils::retry_policy::RetryPolicy;

/// 单元处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Init,
    Fetching,
    Detecting,
    Extracting,
    /// 第 n 次尝试失败
    Failed(u32),
    Success,
    Exhausted,
}

impl UnitState {
    fn stage(self) -> Option<Stage> {
        match self {
            UnitState::Fetching => Some(Stage::Fetching),
            UnitState::Detecting => Some(Stage::Detecting),
            UnitState::Extracting => Some(Stage::Extracting),
            _ => None,
        }
    }
}

/// 一次失败尝试的阶段与原因
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub stage: Stage,
    pub error: ScrapeError,
}

impl AttemptFailure {
    fn new(stage: Stage, error: ScrapeError) -> Self {
        // 页面稳定等待超时属于获取阶段
        let stage = match error {
            ScrapeError::Fetch(_) => Stage::Fetching,
            _ => stage,
        };
        Self { stage, error }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.error)
    }
}

/// 单元处理结果
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub unit: Unit,
    /// 成功时的抽取结果
    pub result: Option<ExtractionResult>,
    /// 实际尝试次数
    pub attempts: u32,
    /// 最后一次失败
    pub last_error: Option<AttemptFailure>,
    /// 经过的状态序列
    pub trail: Vec<UnitState>,
    /// 成功那次尝试的对齐诊断
    pub mismatches: Vec<AlignmentMismatch>,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    pub fn final_state(&self) -> UnitState {
        self.trail.last().copied().unwrap_or(UnitState::Init)
    }
}

/// 单元工作器
///
/// 以有限重试的状态机驱动 获取 → 就绪检测 → 抽取。
/// 任意阶段失败都会关闭页面并从导航开始整体重试。
#[derive(Debug)]
pub struct UnitWorker {
    detector: ReadinessDetector,
    schema: ColumnSchemaExtractor,
    mapper: AttributeMapper,
    policy: RetryPolicy,
}

impl UnitWorker {
    pub fn new(
        detector: ReadinessDetector,
        schema: ColumnSchemaExtractor,
        mapper: AttributeMapper,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            detector,
            schema,
            mapper,
            policy,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ReadinessDetector::from_settings(&settings.readiness),
            ColumnSchemaExtractor::from_selectors(&settings.selectors.columns),
            AttributeMapper::from_settings(&settings.selectors),
            RetryPolicy::from_settings(&settings.retry),
        )
    }

    /// 替换重试策略
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 处理一个单元直到成功或重试耗尽
    #[instrument(skip(self, session, unit), fields(brand = %unit.brand, model = %unit.model))]
    pub async fn process(&self, session: &dyn BrowserSession, unit: &Unit) -> UnitOutcome {
        let mut trail = vec![UnitState::Init];
        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;
            metrics::record_attempt();

            let attempt = AssertUnwindSafe(self.attempt(session, unit, &mut trail))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(fault(&trail, payload)));

            match attempt {
                Ok(report) => {
                    info!(
                        attempt = attempts,
                        columns = report.result.columns().count(),
                        pairs = report.result.pair_count(),
                        mismatches = report.mismatches.len(),
                        "Unit extracted"
                    );
                    trail.push(UnitState::Success);
                    metrics::record_unit(true);
                    return UnitOutcome {
                        unit: unit.clone(),
                        result: Some(report.result),
                        attempts,
                        last_error,
                        trail,
                        mismatches: report.mismatches,
                    };
                }
                Err(failure) => {
                    warn!(
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts,
                        "Attempt failed at {}",
                        failure
                    );
                    trail.push(UnitState::Failed(attempts));
                    last_error = Some(failure);
                }
            }

            if !self.policy.should_retry(attempts) {
                break;
            }
            let backoff = self.policy.calculate_backoff();
            info!("Retrying in {:?}", backoff);
            sleep(backoff).await;
        }

        error!(attempts, "Unit exhausted its retry budget");
        trail.push(UnitState::Exhausted);
        metrics::record_unit(false);
        UnitOutcome {
            unit: unit.clone(),
            result: None,
            attempts,
            last_error,
            trail,
            mismatches: Vec::new(),
        }
    }

    async fn attempt(
        &self,
        session: &dyn BrowserSession,
        unit: &Unit,
        trail: &mut Vec<UnitState>,
    ) -> Result<ExtractionReport, AttemptFailure> {
        trail.push(UnitState::Fetching);
        let page = session
            .fetch(&unit.url)
            .await
            .map_err(|e| AttemptFailure::new(Stage::Fetching, e.into()))?;

        let staged = AssertUnwindSafe(self.run_stages(page.as_ref(), trail))
            .catch_unwind()
            .await;
        page.close().await;

        staged.unwrap_or_else(|payload| Err(fault(trail, payload)))
    }

    async fn run_stages(
        &self,
        page: &dyn PageHandle,
        trail: &mut Vec<UnitState>,
    ) -> Result<ExtractionReport, AttemptFailure> {
        trail.push(UnitState::Detecting);
        self.detector
            .wait_until_ready(page)
            .await
            .map_err(|e| AttemptFailure::new(Stage::Detecting, e))?;

        trail.push(UnitState::Extracting);
        let columns = self
            .schema
            .extract(page)
            .await
            .map_err(|e| AttemptFailure::new(Stage::Extracting, e))?;
        self.mapper
            .extract(page, &columns)
            .await
            .map_err(|e| AttemptFailure::new(Stage::Extracting, e))
    }
}

/// 把尝试过程中的崩溃转换为失败
fn fault(trail: &[UnitState], payload: Box<dyn Any + Send>) -> AttemptFailure {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    };
    let stage = trail
        .iter()
        .rev()
        .find_map(|state| state.stage())
        .unwrap_or(Stage::Fetching);
    AttemptFailure {
        stage,
        error: ScrapeError::Fault(message),
    }
}
