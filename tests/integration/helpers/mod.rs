// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod scripted_session;

use carspec::config::settings::Settings;
use carspec::utils::retry_policy::RetryPolicy;
use carspec::workers::UnitWorker;

pub use scripted_session::ScriptedSession;

pub const STANDARD: &str = "2024款 标准版";
pub const LONG_RANGE: &str = "2024款 长续航版";
pub const FLAGSHIP: &str = "2024款 旗舰版";

/// 三列对比页：长度行三个取值（第三个为占位符），宽度行只有两个取值
pub fn comparison_page(length: &str) -> String {
    format!(
        r#"<html><body>
        <div class="table-box main-table-box">
            <div class="header">
                <span class="car-style-info"> {STANDARD} </span>
                <span class="car-style-info">{LONG_RANGE}</span>
                <span class="car-style-info">{FLAGSHIP}</span>
            </div>
            <table>
                <tr class="data-tr">
                    <td class="name">长度(mm)</td>
                    <td class="text">{length}</td>
                    <td class="text">{length}</td>
                    <td class="text">——</td>
                </tr>
                <tr class="data-tr">
                    <td class="name">宽度(mm)</td>
                    <td class="text">1850</td>
                    <td class="text">1850</td>
                </tr>
            </table>
        </div>
        </body></html>"#
    )
}

/// 默认配置的工作器，重试之间不等待
pub fn worker(max_attempts: u32) -> UnitWorker {
    let settings = Settings::default_settings().expect("default settings");
    UnitWorker::from_settings(&settings).with_policy(RetryPolicy::immediate(max_attempts))
}
