// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter};

pub const UNITS_TOTAL: &str = "carspec_units_total";
pub const UNITS_SUCCEEDED: &str = "carspec_units_succeeded_total";
pub const UNITS_EXHAUSTED: &str = "carspec_units_exhausted_total";
pub const ATTEMPTS_TOTAL: &str = "carspec_attempts_total";
pub const ALIGNMENT_MISMATCHES: &str = "carspec_alignment_mismatches_total";
pub const PERSIST_FAILURES: &str = "carspec_persist_failures_total";

/// 注册指标描述
///
/// 不安装导出器；未安装记录器时计数器为空操作
pub fn init_metrics() {
    describe_counter!(UNITS_TOTAL, "Total number of units processed");
    describe_counter!(UNITS_SUCCEEDED, "Units that produced an extraction result");
    describe_counter!(UNITS_EXHAUSTED, "Units that exhausted their retry budget");
    describe_counter!(ATTEMPTS_TOTAL, "Fetch-detect-extract attempts across all units");
    describe_counter!(
        ALIGNMENT_MISMATCHES,
        "Attribute rows whose value count differed from the column count"
    );
    describe_counter!(PERSIST_FAILURES, "Per-unit artifacts that failed to write");
}

pub fn record_attempt() {
    counter!(ATTEMPTS_TOTAL).increment(1);
}

pub fn record_unit(succeeded: bool) {
    counter!(UNITS_TOTAL).increment(1);
    if succeeded {
        counter!(UNITS_SUCCEEDED).increment(1);
    } else {
        counter!(UNITS_EXHAUSTED).increment(1);
    }
}

pub fn record_mismatches(count: usize) {
    if count > 0 {
        counter!(ALIGNMENT_MISMATCHES).increment(count as u64);
    }
}

pub fn record_persist_failure() {
    counter!(PERSIST_FAILURES).increment(1);
}
