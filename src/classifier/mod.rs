//! 分类模块：账户匹配核心逻辑
pub mod global;
pub mod classifier;

// 导出核心接口
pub use self::global::{classify_transaction, init_classifier};
pub use self::classifier::{AccountClassifier, Classification, ClassifyStats};
