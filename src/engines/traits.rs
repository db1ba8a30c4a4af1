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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 页面获取错误
///
/// 导航阶段（含"内容就绪"等待）产生的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 导航超时
    #[error("Navigation timed out after {0:?}")]
    Timeout(Duration),
    /// 页面在限定时间内未进入稳定状态
    #[error("Content did not settle within {0:?}")]
    NotSettled(Duration),
    /// 浏览器会话错误
    #[error("Browser session error: {0}")]
    Session(String),
}

/// 页面查询错误
///
/// 针对已加载页面的结构化查询失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// 选择器无法解析
    #[error("Invalid selector `{0}`")]
    InvalidSelector(String),
    /// 查询失败
    #[error("Query `{selector}` failed: {message}")]
    Query { selector: String, message: String },
    /// 读取元素文本失败
    #[error("Failed to read element text: {0}")]
    Text(String),
    /// 元素已脱离文档
    #[error("Element is detached from the document")]
    Detached,
}

/// 页面元素句柄
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// 元素的文本内容（未裁剪）
    async fn text(&self) -> Result<String, PageError>;

    /// 在元素内部按选择器查询后代元素
    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError>;
}

/// 已导航完成的页面句柄
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// 按选择器查询整个文档
    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError>;

    /// 等待 DOM 加载完成且网络空闲
    async fn wait_for_load_state(&self, timeout: Duration) -> Result<(), FetchError>;

    /// 等待至少一个匹配元素可见
    ///
    /// 超时返回 `Ok(false)`，只有选择器无效时才返回错误
    async fn wait_for_visible(&self, selector: &str, timeout: Duration)
        -> Result<bool, PageError>;

    /// 关闭页面
    async fn close(self: Box<Self>);
}

/// 浏览器会话
///
/// 由批处理独占持有：开始时获取一次，结束时通过 `close` 释放一次
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 打开新页面并导航到目标地址
    async fn fetch(&self, url: &str) -> Result<Box<dyn PageHandle>, FetchError>;

    /// 会话名称
    fn name(&self) -> &'static str;

    /// 释放会话持有的浏览器资源
    async fn close(self: Box<Self>) -> Result<(), FetchError>;
}

/// 查询作用域：整个页面或某个元素
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    Page(&'a dyn PageHandle),
    Element(&'a dyn ElementHandle),
}

impl Scope<'_> {
    /// 在当前作用域内执行查询
    pub async fn query(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, PageError> {
        match self {
            Scope::Page(page) => page.query(selector).await,
            Scope::Element(element) => element.query(selector).await,
        }
    }
}
