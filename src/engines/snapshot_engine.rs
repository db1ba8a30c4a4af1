// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 静态快照引擎
//!
//! 基于 `scraper` 对已保存的 HTML 执行与浏览器相同的查询接口，
//! 用于离线重放、测试以及幂等性验证。快照内容不会变化，
//! 因此所有等待操作都立即返回。

use crate::engines::traits::{BrowserSession, ElementHandle, FetchError, PageError, PageHandle};
use async_trait::async_trait;
use ego_tree::NodeId;
use parking_lot::Mutex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn parse_selector(selector: &str) -> Result<Selector, PageError> {
    Selector::parse(selector).map_err(|_| PageError::InvalidSelector(selector.to_string()))
}

/// 解析后的文档，页面与其所有元素共享
type SharedDocument = Arc<Mutex<Html>>;

fn wrap_nodes(document: &SharedDocument, nodes: Vec<NodeId>) -> Vec<Box<dyn ElementHandle>> {
    nodes
        .into_iter()
        .map(|node| {
            Box::new(SnapshotElement {
                document: Arc::clone(document),
                node,
            }) as Box<dyn ElementHandle>
        })
        .collect()
}

/// 快照中的元素
///
/// 以节点 ID 引用共享文档中的元素，文档只解析一次
#[derive(Debug, Clone)]
pub struct SnapshotElement {
    document: SharedDocument,
    node: NodeId,
}

impl SnapshotElement {
    fn with_element<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> Result<R, PageError> {
        let document = self.document.lock();
        let element = document
            .tree
            .get(self.node)
            .and_then(ElementRef::wrap)
            .ok_or(PageError::Detached)?;
        Ok(f(element))
    }
}

#[async_trait]
impl ElementHandle for SnapshotElement {
    async fn text(&self) -> Result<String, PageError> {
        self.with_element(|element| element.text().collect::<String>())
    }

    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        let parsed = parse_selector(selector)?;
        let nodes: Vec<NodeId> = self.with_element(|element| {
            element.select(&parsed).map(|child| child.id()).collect()
        })?;
        Ok(wrap_nodes(&self.document, nodes))
    }
}

/// 静态 HTML 页面
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    document: SharedDocument,
}

impl SnapshotPage {
    pub fn new(html: impl AsRef<str>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Html::parse_document(html.as_ref()))),
        }
    }

    fn select_ids(&self, selector: &str) -> Result<Vec<NodeId>, PageError> {
        let parsed = parse_selector(selector)?;
        let document = self.document.lock();
        let nodes = document.select(&parsed).map(|element| element.id()).collect();
        Ok(nodes)
    }
}

#[async_trait]
impl PageHandle for SnapshotPage {
    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        let nodes = self.select_ids(selector)?;
        Ok(wrap_nodes(&self.document, nodes))
    }

    async fn wait_for_load_state(&self, _timeout: Duration) -> Result<(), FetchError> {
        Ok(())
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, PageError> {
        Ok(!self.select_ids(selector)?.is_empty())
    }

    async fn close(self: Box<Self>) {}
}

/// 快照会话
///
/// 按 URL 提供预先登记的 HTML，每次获取都解析出一个新页面
#[derive(Debug, Clone, Default)]
pub struct SnapshotSession {
    pages: HashMap<String, Arc<str>>,
}

impl SnapshotSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个页面快照
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<Arc<str>>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

#[async_trait]
impl BrowserSession for SnapshotSession {
    async fn fetch(&self, url: &str) -> Result<Box<dyn PageHandle>, FetchError> {
        match self.pages.get(url) {
            Some(html) => Ok(Box::new(SnapshotPage::new(html))),
            None => Err(FetchError::Navigation(format!("No snapshot for {}", url))),
        }
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        Ok(())
    }
}
