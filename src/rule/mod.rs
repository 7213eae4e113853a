//! 规则模块：负责账户规则的数据模型定义与加载
pub mod model;
pub mod loader;

// 导出核心接口
pub use self::model::{
    AccountRule, FieldCondition, MatchField, MatchPattern, PatternKind, PatternSpec, RuleEntry,
};
pub use self::loader::{RuleLoader, read_account_rules, write_account_rules};
