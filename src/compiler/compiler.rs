//! 规则编译器核心
//! 仅负责将账户规则编译为可执行的匹配器，并按优先级排序

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::pattern::{
    CompiledAccountRule, CompiledCondition, CompiledPattern, CompiledRuleSet, Matcher, rule_label,
};
use crate::config::ClassifierConfig;
use crate::error::{AccResult, AccregexError};
use crate::rule::{AccountRule, FieldCondition, MatchPattern, PatternKind};

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则集
    pub fn compile(rules: &[AccountRule], config: &ClassifierConfig) -> AccResult<CompiledRuleSet> {
        let start = Instant::now();
        let mut stats = CompileStats::default();
        let mut compiled_rules = Vec::with_capacity(rules.len());

        // 1. 逐条编译，宽松模式下跳过失败规则
        for (index, rule) in rules.iter().enumerate() {
            match Self::compile_rule(index, rule, config) {
                Ok(compiled) => {
                    stats.record(&compiled);
                    compiled_rules.push(compiled);
                }
                Err(e) if !config.strict => {
                    warn!("跳过无法编译的规则 {}：{}", rule_label(rule.name(), index), e);
                    stats.skipped_count += 1;
                }
                Err(e) => return Err(e),
            }
        }

        // 2. 按优先级降序排列（稳定排序，同优先级保持文档顺序）
        compiled_rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        // 3. 输出编译统计
        debug!("规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "编译统计：规则{}条（通配{}条）、正则{}条、字符串匹配{}条、跳过{}条",
            compiled_rules.len(),
            stats.match_all_count,
            stats.regex_count,
            stats.literal_count,
            stats.skipped_count
        );

        Ok(CompiledRuleSet {
            rules: compiled_rules,
            skipped: stats.skipped_count,
        })
    }

    /// 编译单条规则
    fn compile_rule(
        index: usize,
        rule: &AccountRule,
        config: &ClassifierConfig,
    ) -> AccResult<CompiledAccountRule> {
        let ignore_case = config.case_insensitive || rule.case_insensitive();

        let pattern = match rule.pattern() {
            MatchPattern::All => CompiledPattern::All,
            MatchPattern::Conditions(conditions) => CompiledPattern::Conditions(
                conditions
                    .iter()
                    .map(|condition| Self::compile_condition(index, rule, condition, ignore_case))
                    .collect::<AccResult<Vec<_>>>()?,
            ),
        };

        Ok(CompiledAccountRule {
            name: rule.name().map(str::to_string),
            account: rule.account().to_string(),
            index,
            priority: rule.priority(),
            pattern,
        })
    }

    /// 编译单个字段条件
    fn compile_condition(
        index: usize,
        rule: &AccountRule,
        condition: &FieldCondition,
        ignore_case: bool,
    ) -> AccResult<CompiledCondition> {
        let fold = |s: &str| {
            if ignore_case {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };

        let mut matchers = Vec::with_capacity(condition.matchers().len());
        for kind in condition.matchers() {
            let matcher = match kind {
                PatternKind::Regex(raw) => {
                    let regex = Self::compile_regex(raw, ignore_case).map_err(|source| {
                        AccregexError::RegexCompileError {
                            rule: rule_label(rule.name(), index),
                            source,
                        }
                    })?;
                    Matcher::Regex(regex)
                }
                PatternKind::Contains(s) => Matcher::Contains(fold(s)),
                PatternKind::StartsWith(s) => Matcher::StartsWith(fold(s)),
                PatternKind::Equals(s) => Matcher::Equals(fold(s)),
            };
            matchers.push(matcher);
        }

        Ok(CompiledCondition {
            field: condition.field(),
            matchers,
            ignore_case,
        })
    }

    /// 编译单个正则，支持 `/pattern/flags` 分隔写法（flags 取 i / m / s / x）
    pub fn compile_regex(raw_pattern: &str, ignore_case: bool) -> Result<Regex, regex::Error> {
        static DELIMITED_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?s)^/(.+)/([imsx]*)$").unwrap());

        let (pattern, flags) = match DELIMITED_REGEX.captures(raw_pattern) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => (raw_pattern, ""),
        };

        RegexBuilder::new(pattern)
            .case_insensitive(ignore_case || flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build()
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    match_all_count: usize,
    regex_count: usize,
    literal_count: usize,
    skipped_count: usize,
}

impl CompileStats {
    fn record(&mut self, rule: &CompiledAccountRule) {
        match &rule.pattern {
            CompiledPattern::All => self.match_all_count += 1,
            CompiledPattern::Conditions(conditions) => {
                for matcher in conditions.iter().flat_map(|c| c.matchers.iter()) {
                    match matcher {
                        Matcher::Regex(_) => self.regex_count += 1,
                        _ => self.literal_count += 1,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::rule::{MatchField, read_account_rules};
    use crate::transaction::Transaction;

    #[test]
    fn test_compile_regex_plain() {
        let regex = RuleCompiler::compile_regex(r"^POS \d+", false).unwrap();
        assert!(regex.is_match("POS 4421"));
        assert!(!regex.is_match("pos 4421"));
    }

    #[test]
    fn test_compile_regex_delimited_flags() {
        let regex = RuleCompiler::compile_regex("/safeway/i", false).unwrap();
        assert!(regex.is_match("SAFEWAY #12"));

        let regex = RuleCompiler::compile_regex("/^rent$/m", false).unwrap();
        assert!(regex.is_match("note\nrent\n"));
    }

    #[test]
    fn test_compile_regex_global_ignore_case() {
        let regex = RuleCompiler::compile_regex("safeway", true).unwrap();
        assert!(regex.is_match("SafeWay"));
    }

    #[test]
    fn test_compile_orders_by_priority_then_document() {
        let rules = read_account_rules(
            r#"[
                {"name": "a", "account": "A"},
                {"name": "b", "account": "B", "priority": 5},
                {"name": "c", "account": "C"},
                {"name": "d", "account": "D", "priority": -1},
                {"name": "e", "account": "E", "priority": 5}
            ]"#,
        )
        .unwrap();

        let compiled = RuleCompiler::compile(&rules, &ConfigManager::get_default()).unwrap();
        let order: Vec<_> = compiled.iter().map(|r| r.name.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["b", "e", "a", "c", "d"]);
        assert_eq!(compiled.rules[0].index, 1);
    }

    #[test]
    fn test_invalid_regex_strict_fails() {
        let rules = read_account_rules(r#"[{"name": "broken", "account": "A", "pattern": "(unclosed"}]"#).unwrap();
        let err = RuleCompiler::compile(&rules, &ConfigManager::get_default()).unwrap_err();
        match err {
            AccregexError::RegexCompileError { rule, .. } => assert_eq!(rule, "broken"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_regex_lenient_skips() {
        let rules = read_account_rules(
            r#"[{"account": "A", "pattern": "(unclosed"}, {"account": "B"}]"#,
        )
        .unwrap();
        let config = ConfigManager::custom().strict(false).build();
        let compiled = RuleCompiler::compile(&rules, &config).unwrap();

        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled.skipped, 1);
        assert_eq!(compiled.rules[0].account, "B");
    }

    #[test]
    fn test_case_insensitive_literals() {
        let rules = read_account_rules(
            r#"[{"account": "A", "case_insensitive": true, "match": {"memo": {"contains": "Card"}}}]"#,
        )
        .unwrap();
        let compiled = RuleCompiler::compile(&rules, &ConfigManager::get_default()).unwrap();

        let rule = &compiled.rules[0];
        assert!(rule.is_match(&Transaction::new("x").with_memo("VISA CARD 99")));
        match &rule.pattern {
            CompiledPattern::Conditions(conditions) => {
                assert_eq!(conditions[0].field, MatchField::Memo);
                assert_eq!(conditions[0].matchers[0].describe(), r#"contains "card""#);
            }
            CompiledPattern::All => panic!("expected conditions"),
        }
    }
}
