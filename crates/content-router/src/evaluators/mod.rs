//! 内置评估器插件
//!
//! 每个评估器独立认领字段并实现其比较语义，
//! 通过注册表按优先级组合成完整引擎。

mod certification;
mod genre;
mod language;
mod user;
mod year;

pub use certification::CertificationEvaluator;
pub use genre::GenreEvaluator;
pub use language::LanguageEvaluator;
pub use user::UserEvaluator;
pub use year::YearEvaluator;

use std::sync::Arc;

use crate::registry::EvaluatorRegistry;
use crate::store::RuleStoreAdapter;

/// 注册全部内置评估器
pub fn register_builtin(registry: &mut EvaluatorRegistry, store: Arc<dyn RuleStoreAdapter>) {
    registry.register(Arc::new(GenreEvaluator::new(store.clone())));
    registry.register(Arc::new(UserEvaluator::new(store.clone())));
    registry.register(Arc::new(LanguageEvaluator::new(store.clone())));
    registry.register(Arc::new(YearEvaluator::new(store.clone())));
    registry.register(Arc::new(CertificationEvaluator::new(store)));
}
