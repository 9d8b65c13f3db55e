//! 路由引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("条件树嵌套过深: 深度 {depth} 超过上限 {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    #[error("条件树存在循环引用: 节点 '{0}' 被重复访问")]
    CyclicReference(String),

    #[error("条件组 '{0}' 不能为空")]
    EmptyGroup(String),

    #[error("条件 '{path}' 不完整: {reason}")]
    IncompleteCondition { path: String, reason: String },

    #[error("规则未找到: {0}")]
    RuleNotFound(i64),

    #[error("规则存储错误: {0}")]
    StoreError(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;
