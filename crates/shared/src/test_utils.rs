//! 测试工具模块
//!
//! 提供集成测试所需的辅助函数和测试数据生成器。

use uuid::Uuid;

/// 初始化测试日志
///
/// 幂等，可在每个测试开头调用。
pub fn init_test_tracing() {
    use crate::config::ObservabilityConfig;

    let config = ObservabilityConfig {
        service_name: "test".to_string(),
        log_level: "debug".to_string(),
        json_logs: false,
    };
    let _ = crate::observability::init(&config);
}

/// 生成唯一的测试用户名
pub fn test_user_name() -> String {
    format!("test-user-{}", Uuid::new_v4())
}

/// 生成唯一的测试规则 ID
///
/// 使用原子计数器确保并行测试时的唯一性
pub fn test_rule_id() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    static COUNTER: AtomicI64 = AtomicI64::new(1);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}
