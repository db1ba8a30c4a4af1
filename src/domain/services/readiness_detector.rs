// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{ReadinessSettings, DEFAULT_READINESS_MARKERS};
use crate::engines::traits::PageHandle;
use crate::utils::errors::ScrapeError;
use std::time::Duration;
use tracing::{debug, info};

/// 就绪检测器
///
/// 先等待页面稳定（DOM 加载完成且网络空闲），
/// 再按优先级逐个等待结构标记可见
#[derive(Debug, Clone)]
pub struct ReadinessDetector {
    markers: Vec<String>,
    load_state_timeout: Duration,
    selector_timeout: Duration,
}

impl Default for ReadinessDetector {
    fn default() -> Self {
        Self {
            markers: DEFAULT_READINESS_MARKERS.iter().map(|s| s.to_string()).collect(),
            load_state_timeout: Duration::from_secs(60),
            selector_timeout: Duration::from_secs(30),
        }
    }
}

impl ReadinessDetector {
    pub fn new(markers: Vec<String>, load_state_timeout: Duration, selector_timeout: Duration) -> Self {
        Self {
            markers,
            load_state_timeout,
            selector_timeout,
        }
    }

    pub fn from_settings(settings: &ReadinessSettings) -> Self {
        Self::new(
            settings.markers.clone(),
            settings.load_state_timeout(),
            settings.selector_timeout(),
        )
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// 等待页面就绪，返回第一个可见的标记选择器
    ///
    /// # Errors
    ///
    /// * `ScrapeError::Fetch` - 页面未在限定时间内稳定
    /// * `ScrapeError::ReadinessTimeout` - 所有标记都未出现
    pub async fn wait_until_ready(&self, page: &dyn PageHandle) -> Result<String, ScrapeError> {
        page.wait_for_load_state(self.load_state_timeout).await?;

        for marker in &self.markers {
            match page.wait_for_visible(marker, self.selector_timeout).await {
                Ok(true) => {
                    info!(marker = marker.as_str(), "Page content ready");
                    return Ok(marker.clone());
                }
                Ok(false) => {
                    debug!(marker = marker.as_str(), "Marker not visible, trying next");
                }
                // 单个标记探测失败按未命中处理
                Err(e) => {
                    debug!(marker = marker.as_str(), "Marker check failed: {}", e);
                }
            }
        }

        Err(ScrapeError::ReadinessTimeout {
            tried: self.markers.len(),
        })
    }
}
