//! accregex - 基于正则规则的交易账户分类工具
//!
//! 从 JSON 读取账户规则，按优先级依次匹配交易字段，输出目标账户。

// 导出全局错误类型
pub use self::error::{AccregexError, AccResult};

// 导出配置模块
pub use self::config::{ClassifierConfig, ConfigManager, CustomConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{
    AccountRule, FieldCondition, MatchField, MatchPattern, PatternKind, RuleLoader,
    read_account_rules, write_account_rules,
};

// 导出交易模块核心接口
pub use self::transaction::{Transaction, TransactionReader};

// 导出编译模块核心接口
pub use self::compiler::{CompiledAccountRule, CompiledRuleSet, RuleCompiler};

// 导出分类模块核心接口
pub use self::classifier::{
    AccountClassifier, Classification, ClassifyStats, classify_transaction, init_classifier,
};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod transaction;
pub mod compiler;
pub mod classifier;
