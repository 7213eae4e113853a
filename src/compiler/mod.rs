//! 编译模块：将账户规则编译为可执行的匹配器
pub mod pattern;
pub mod compiler;

pub use self::pattern::{
    CompiledAccountRule, CompiledCondition, CompiledPattern, CompiledRuleSet, Matcher,
};
pub use self::compiler::RuleCompiler;
