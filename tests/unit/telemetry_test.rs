// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use carspec::utils::telemetry;

    #[test]
    fn test_telemetry_initialization_is_repeatable() {
        telemetry::init_telemetry();
        telemetry::init_telemetry();

        tracing::info!(brand = "比亚迪", model = "汉", "Unit extracted");
    }
}
