// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use carspec::engines::snapshot_engine::SnapshotSession;
use carspec::engines::traits::{BrowserSession, ElementHandle, FetchError, PageError, PageHandle};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 可编排失败的测试会话
///
/// 每个地址可以设置前 N 次获取失败，或者在获取时崩溃；
/// 其余请求交给快照会话处理，返回的页面会记录关闭次数
#[derive(Default)]
pub struct ScriptedSession {
    inner: SnapshotSession,
    failures: HashMap<String, u32>,
    panics: HashSet<String>,
    fetches: Mutex<HashMap<String, u32>>,
    closed: Arc<AtomicBool>,
    pages_opened: AtomicUsize,
    pages_closed: Arc<AtomicUsize>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<Arc<str>>) -> Self {
        self.inner = self.inner.with_page(url, html);
        self
    }

    /// 前 `times` 次获取失败
    pub fn failing(mut self, url: &str, times: u32) -> Self {
        self.failures.insert(url.to_string(), times);
        self
    }

    /// 每次获取都失败
    pub fn always_failing(self, url: &str) -> Self {
        self.failing(url, u32::MAX)
    }

    /// 获取时崩溃
    pub fn panicking(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    pub fn fetch_count(&self, url: &str) -> u32 {
        self.fetches
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or_default()
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }

    /// 会话关闭标记，需在交出会话所有权之前获取
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn fetch(&self, url: &str) -> Result<Box<dyn PageHandle>, FetchError> {
        let count = {
            let mut fetches = self.fetches.lock().unwrap();
            let count = fetches.entry(url.to_string()).or_default();
            *count += 1;
            *count
        };

        if self.panics.contains(url) {
            panic!("renderer crashed");
        }
        if count <= self.failures.get(url).copied().unwrap_or_default() {
            return Err(FetchError::Navigation(format!("transient failure #{}", count)));
        }
        let page = self.inner.fetch(url).await?;
        self.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingPage {
            inner: page,
            closes: Arc::clone(&self.pages_closed),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        assert!(
            !self.closed.swap(true, Ordering::SeqCst),
            "session closed twice"
        );
        Ok(())
    }
}

/// 记录关闭次数的页面包装
struct CountingPage {
    inner: Box<dyn PageHandle>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PageHandle for CountingPage {
    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        self.inner.query(selector).await
    }

    async fn wait_for_load_state(&self, timeout: Duration) -> Result<(), FetchError> {
        self.inner.wait_for_load_state(timeout).await
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, PageError> {
        self.inner.wait_for_visible(selector, timeout).await
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await;
    }
}
