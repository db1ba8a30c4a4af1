// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// 默认的页面就绪标记选择器（按优先级）
pub const DEFAULT_READINESS_MARKERS: [&str; 5] = [
    "div.table-box.main-table-box",
    ".car-config",
    ".parameter-list",
    ".config-list",
    ".spec-list",
];

/// 默认的车型列头选择器链
pub const DEFAULT_COLUMN_SELECTORS: [&str; 5] = [
    "span.car-style-info",
    ".car-name",
    ".car-type",
    ".config-header .item",
    ".param-header .item",
];

/// 默认的参数行选择器链
pub const DEFAULT_ROW_SELECTORS: [&str; 4] = [
    "div.table-box.main-table-box tr.data-tr",
    ".parameter-list tr",
    ".config-list tr",
    ".spec-list tr",
];

/// 默认的参数名单元格选择器链
pub const DEFAULT_LABEL_SELECTORS: [&str; 4] =
    ["td.name", "td:first-child", ".param-name", ".label"];

/// 默认的参数值单元格选择器链
pub const DEFAULT_VALUE_SELECTORS: [&str; 4] = [
    "td.text",
    "td:not(:first-child)",
    ".param-value",
    ".value",
];

/// 应用程序配置设置
///
/// 包含输入输出、浏览器、就绪检测、选择器、重试和批处理等所有配置项
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    /// 输入配置
    pub input: InputSettings,
    /// 输出配置
    #[serde(default)]
    pub output: OutputSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 就绪检测配置
    #[validate(nested)]
    pub readiness: ReadinessSettings,
    /// 选择器配置
    #[validate(nested)]
    pub selectors: SelectorSettings,
    /// 重试配置
    #[validate(nested)]
    pub retry: RetrySettings,
    /// 批处理配置
    #[validate(nested)]
    pub batch: BatchSettings,
}

/// 输入配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    /// 车型列表文件路径
    pub path: String,
}

/// 输出配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSettings {
    /// 输出目录，未设置时使用当前时间（精确到分钟）命名
    pub dir: Option<String>,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头模式
    pub headless: bool,
    /// CDP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 远程调试地址，设置后连接已有 Chrome 实例而不是启动新进程
    pub remote_debugging_url: Option<String>,
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<String>,
    /// 额外的启动参数
    pub args: Vec<String>,
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

/// 就绪检测配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReadinessSettings {
    /// 结构标记选择器（按优先级）
    #[validate(length(min = 1))]
    pub markers: Vec<String>,
    /// 等待页面稳定的超时（毫秒）
    pub load_state_timeout_ms: u64,
    /// 每个标记选择器的等待超时（毫秒）
    pub selector_timeout_ms: u64,
    /// 轮询间隔（毫秒）
    #[validate(range(min = 10))]
    pub poll_interval_ms: u64,
}

impl ReadinessSettings {
    pub fn load_state_timeout(&self) -> Duration {
        Duration::from_millis(self.load_state_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 选择器配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SelectorSettings {
    /// 车型列头选择器链
    #[validate(length(min = 1))]
    pub columns: Vec<String>,
    /// 参数行选择器链
    #[validate(length(min = 1))]
    pub rows: Vec<String>,
    /// 参数名单元格选择器链
    #[validate(length(min = 1))]
    pub label: Vec<String>,
    /// 参数值单元格选择器链
    #[validate(length(min = 1))]
    pub values: Vec<String>,
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RetrySettings {
    /// 每个车型的最大尝试次数
    #[validate(range(min = 1))]
    pub max_attempts: u32,
    /// 退避下限（毫秒）
    pub backoff_min_ms: u64,
    /// 退避上限（毫秒）
    pub backoff_max_ms: u64,
}

/// 批处理配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchSettings {
    /// 同时处理的车型数量，1 表示严格顺序处理
    #[validate(range(min = 1, max = 32))]
    pub workers: usize,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `CARSPEC__` 前缀的环境变量，然后做合法性校验。
    /// 选择器链、就绪标记和浏览器参数在环境变量中以逗号分隔
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CARSPEC")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("readiness.markers")
                    .with_list_parse_key("selectors.columns")
                    .with_list_parse_key("selectors.rows")
                    .with_list_parse_key("selectors.label")
                    .with_list_parse_key("selectors.values")
                    .with_list_parse_key("browser.args"),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validated()
    }

    /// 仅由内置默认值构建的配置
    pub fn default_settings() -> Result<Self, ConfigError> {
        let settings: Settings = Self::defaults()?.build()?.try_deserialize()?;
        settings.validated()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Input / output
            .set_default("input.path", "car_list.json")?
            // Browser
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            .set_default("browser.navigation_timeout_ms", 30_000)?
            .set_default("browser.args", vec!["--disable-gpu", "--disable-dev-shm-usage"])?
            // Readiness
            .set_default("readiness.markers", DEFAULT_READINESS_MARKERS.to_vec())?
            .set_default("readiness.load_state_timeout_ms", 60_000)?
            .set_default("readiness.selector_timeout_ms", 30_000)?
            .set_default("readiness.poll_interval_ms", 250)?
            // Selectors
            .set_default("selectors.columns", DEFAULT_COLUMN_SELECTORS.to_vec())?
            .set_default("selectors.rows", DEFAULT_ROW_SELECTORS.to_vec())?
            .set_default("selectors.label", DEFAULT_LABEL_SELECTORS.to_vec())?
            .set_default("selectors.values", DEFAULT_VALUE_SELECTORS.to_vec())?
            // Retry
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.backoff_min_ms", 5_000)?
            .set_default("retry.backoff_max_ms", 10_000)?
            // Batch
            .set_default("batch.workers", 1)
    }

    /// 校验配置取值
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Message(format!("Invalid settings: {}", e)))?;
        if self.retry.backoff_min_ms > self.retry.backoff_max_ms {
            return Err(ConfigError::Message(
                "Invalid settings: retry.backoff_min_ms exceeds retry.backoff_max_ms".to_string(),
            ));
        }
        Ok(self)
    }
}
