// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserSession, ElementHandle, FetchError, PageError, PageHandle};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// 网络空闲判定窗口：没有进行中的请求并持续该时间即视为空闲
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

const TEXT_CONTENT_FN: &str = "function() { return this.textContent; }";

/// 生成"至少一个匹配元素可见"的探测脚本
///
/// 选择器无法解析时脚本返回 `null`
fn visibility_script(selector: &str) -> String {
    // serde_json 的字符串编码同时是合法的 JS 字符串字面量
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        "(() => {{ \
            let nodes; \
            try {{ nodes = document.querySelectorAll({quoted}); }} catch (e) {{ return null; }} \
            return Array.from(nodes).some(el => {{ \
                const style = window.getComputedStyle(el); \
                const rect = el.getBoundingClientRect(); \
                return style.visibility !== 'hidden' && style.display !== 'none' \
                    && rect.width > 0 && rect.height > 0; \
            }}); \
        }})()"
    )
}

/// 轮询可见性探测直到命中或超时
///
/// 探测本身出错（例如页面跳转导致执行上下文销毁）时继续轮询；
/// 只有选择器无法解析时才返回错误
async fn poll_visible<F, Fut>(
    selector: &str,
    deadline: Instant,
    poll_interval: Duration,
    mut check: F,
) -> Result<bool, PageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<bool>, String>>,
{
    loop {
        match check().await {
            Ok(Some(true)) => return Ok(true),
            Ok(Some(false)) => {}
            Ok(None) => return Err(PageError::InvalidSelector(selector.to_string())),
            Err(message) => debug!(selector, "Visibility check failed, retrying: {}", message),
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(poll_interval).await;
    }
}

/// 等待进行中的请求数归零并保持一个空闲窗口
///
/// 截止时间到达时仍有请求进行中则返回 `false`
async fn wait_for_idle(
    inflight: &mut watch::Receiver<usize>,
    window: Duration,
    deadline: Instant,
) -> bool {
    loop {
        let idle = *inflight.borrow_and_update() == 0;
        let wait = if idle {
            window
        } else {
            deadline.saturating_duration_since(Instant::now())
        };

        match timeout(wait, inflight.changed()).await {
            Err(_) => return idle,
            // 监听任务已结束，不会再有新的变化
            Ok(Err(_)) => return idle,
            Ok(Ok(())) => {}
        }
        if Instant::now() >= deadline {
            return *inflight.borrow() == 0;
        }
    }
}

/// 基于 CDP 网络事件统计进行中的请求
struct NetworkMonitor {
    inflight: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    /// 必须在导航之前调用，否则导航期间发出的请求不会被统计
    async fn attach(page: &Page) -> Result<Self, FetchError> {
        let session_error = |e: chromiumoxide::error::CdpError| FetchError::Session(e.to_string());
        let mut sent = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(session_error)?;
        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(session_error)?;
        let mut failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(session_error)?;

        let (tx, inflight) = watch::channel(0usize);
        let task = tokio::spawn(async move {
            let mut pending: HashSet<String> = HashSet::new();
            loop {
                tokio::select! {
                    Some(event) = sent.next() => {
                        pending.insert(event.request_id.inner().clone());
                    }
                    Some(event) = finished.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    Some(event) = failed.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    else => break,
                }
                tx.send_replace(pending.len());
            }
        });

        Ok(Self { inflight, task })
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 基于 chromiumoxide 的浏览器会话
///
/// 显式持有浏览器实例与事件处理任务，由批处理在结束时关闭
pub struct PlaywrightSession {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    poll_interval: Duration,
}

impl PlaywrightSession {
    /// 启动或连接浏览器
    ///
    /// 优先使用配置中的远程调试地址，其次是 `CHROMIUM_REMOTE_DEBUGGING_URL` 环境变量，
    /// 都没有时启动本地 Chrome 进程
    pub async fn launch(
        settings: &BrowserSettings,
        poll_interval: Duration,
    ) -> Result<Self, FetchError> {
        let remote_debugging_url = settings
            .remote_debugging_url
            .clone()
            .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok());

        let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url).await.map_err(|e| {
                FetchError::Session(format!("Failed to connect to remote Chrome: {}", e))
            })?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(settings.request_timeout_secs));
            if !settings.headless {
                builder = builder.with_head();
            }
            if let Some(path) = &settings.chrome_executable {
                builder = builder.chrome_executable(path);
            }
            for arg in &settings.args {
                builder = builder.arg(arg.as_str());
            }
            let config = builder.build().map_err(FetchError::Session)?;

            info!(headless = settings.headless, "Launching Chrome");
            Browser::launch(config)
                .await
                .map_err(|e| FetchError::Session(e.to_string()))?
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            navigation_timeout: settings.navigation_timeout(),
            poll_interval,
        })
    }
}

#[async_trait]
impl BrowserSession for PlaywrightSession {
    async fn fetch(&self, url: &str) -> Result<Box<dyn PageHandle>, FetchError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Session(e.to_string()))?;

        let network = match NetworkMonitor::attach(&page).await {
            Ok(network) => network,
            Err(e) => {
                let _ = page.close().await;
                return Err(e);
            }
        };

        debug!(url, "Navigating");
        let navigation = timeout(self.navigation_timeout, page.goto(url))
            .await
            .map(|result| result.map(|_| ()));
        match navigation {
            Ok(Ok(_)) => Ok(Box::new(PlaywrightPage {
                page,
                network,
                poll_interval: self.poll_interval,
            })),
            Ok(Err(e)) => {
                let _ = page.close().await;
                Err(FetchError::Navigation(e.to_string()))
            }
            Err(_) => {
                let _ = page.close().await;
                Err(FetchError::Timeout(self.navigation_timeout))
            }
        }
    }

    fn name(&self) -> &'static str {
        "playwright"
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        let PlaywrightSession {
            mut browser,
            handler,
            ..
        } = *self;

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| FetchError::Session(e.to_string()));
        if timeout(Duration::from_secs(5), handler).await.is_err() {
            warn!("Browser event handler did not stop after close");
        }
        info!("Browser session closed");
        closed
    }
}

/// chromiumoxide 页面
pub struct PlaywrightPage {
    page: Page,
    network: NetworkMonitor,
    poll_interval: Duration,
}

impl PlaywrightPage {
    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, String> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| e.to_string())?
            .into_value::<T>()
            .map_err(|e| e.to_string())
    }

    async fn wait_for_ready_state(&self, deadline: Instant) -> bool {
        loop {
            if let Ok(state) = self.evaluate::<String>("document.readyState").await {
                if state == "complete" {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.poll_interval).await;
        }
    }
}

fn wrap_elements(elements: Vec<Element>) -> Vec<Box<dyn ElementHandle>> {
    elements
        .into_iter()
        .map(|element| Box::new(PlaywrightElement { element }) as Box<dyn ElementHandle>)
        .collect()
}

#[async_trait]
impl PageHandle for PlaywrightPage {
    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| PageError::Query {
                selector: selector.to_string(),
                message: e.to_string(),
            })?;
        Ok(wrap_elements(elements))
    }

    async fn wait_for_load_state(&self, timeout: Duration) -> Result<(), FetchError> {
        let deadline = Instant::now() + timeout;
        if !self.wait_for_ready_state(deadline).await {
            return Err(FetchError::NotSettled(timeout));
        }
        let mut inflight = self.network.inflight.clone();
        if !wait_for_idle(&mut inflight, NETWORK_IDLE_WINDOW, deadline).await {
            return Err(FetchError::NotSettled(timeout));
        }
        Ok(())
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, PageError> {
        let script = visibility_script(selector);
        poll_visible(selector, Instant::now() + timeout, self.poll_interval, || {
            self.evaluate::<Option<bool>>(&script)
        })
        .await
    }

    async fn close(self: Box<Self>) {
        let PlaywrightPage { page, network, .. } = *self;
        drop(network);
        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

/// chromiumoxide 元素
pub struct PlaywrightElement {
    element: Element,
}

#[async_trait]
impl ElementHandle for PlaywrightElement {
    async fn text(&self) -> Result<String, PageError> {
        let returns = self
            .element
            .call_js_fn(TEXT_CONTENT_FN, false)
            .await
            .map_err(|e| PageError::Text(e.to_string()))?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .map_err(|e| PageError::Query {
                selector: selector.to_string(),
                message: e.to_string(),
            })?;
        Ok(wrap_elements(elements))
    }
}
