// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{ElementHandle, PageError, Scope};
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// 候选元素定位策略
#[async_trait]
pub trait LocateStrategy: Send + Sync {
    /// 在作用域内定位候选元素
    async fn locate(&self, scope: Scope<'_>) -> Result<Vec<Box<dyn ElementHandle>>, PageError>;

    /// 策略描述，用于日志
    fn describe(&self) -> &str;
}

/// CSS 选择器策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssStrategy {
    selector: String,
}

impl CssStrategy {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl LocateStrategy for CssStrategy {
    async fn locate(&self, scope: Scope<'_>) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        scope.query(&self.selector).await
    }

    fn describe(&self) -> &str {
        &self.selector
    }
}

/// 定位结果
pub struct Located {
    /// 命中的策略描述
    pub strategy: String,
    /// 命中的元素（至少一个）
    pub elements: Vec<Box<dyn ElementHandle>>,
}

/// 按优先级排列的定位策略链
///
/// 依次尝试每个策略，第一个返回非空结果的策略获胜
pub struct StrategyChain {
    name: &'static str,
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl StrategyChain {
    pub fn new(name: &'static str, strategies: Vec<Box<dyn LocateStrategy>>) -> Self {
        Self { name, strategies }
    }

    /// 由配置中的选择器列表构建 CSS 策略链
    pub fn from_selectors<S: AsRef<str>>(name: &'static str, selectors: &[S]) -> Self {
        let strategies = selectors
            .iter()
            .map(|s| Box::new(CssStrategy::new(s.as_ref())) as Box<dyn LocateStrategy>)
            .collect();
        Self::new(name, strategies)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// 返回第一个非空的定位结果；全部为空时返回 `None`
    pub async fn locate_first(&self, scope: Scope<'_>) -> Result<Option<Located>, PageError> {
        for (priority, strategy) in self.strategies.iter().enumerate() {
            let elements = strategy.locate(scope).await?;
            if elements.is_empty() {
                debug!(
                    chain = self.name,
                    strategy = strategy.describe(),
                    "No candidates, falling back"
                );
                continue;
            }
            if priority > 0 {
                debug!(
                    chain = self.name,
                    strategy = strategy.describe(),
                    count = elements.len(),
                    "Fallback strategy matched"
                );
            }
            return Ok(Some(Located {
                strategy: strategy.describe().to_string(),
                elements,
            }));
        }
        Ok(None)
    }
}

impl fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyChain")
            .field("name", &self.name)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.describe()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
