mod test_builder;
mod test_ratings;

use crate::builder::EngineBuilder;

/// Route `log` output through the test harness.
pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Small, fast, reproducible engine for tests.
pub fn test_builder() -> EngineBuilder {
    EngineBuilder::new()
        .with_hidden_width(16)
        .with_seed(42)
        .with_report_every(10)
}
