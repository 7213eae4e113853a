//! 分类器核心：按优先级顺序匹配规则，输出交易的目标账户
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::compiler::{CompiledAccountRule, CompiledRuleSet, RuleCompiler};
use crate::config::ClassifierConfig;
use crate::error::AccResult;
use crate::rule::{AccountRule, RuleLoader};
use crate::transaction::Transaction;

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub account: String,
    /// 命中规则的名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    /// 命中规则在原始文档中的位置；兜底账户时为 None
    pub rule_index: Option<usize>,
}

impl Classification {
    fn from_rule(rule: &CompiledAccountRule) -> Self {
        Self {
            account: rule.account.clone(),
            rule_name: rule.name.clone(),
            rule_index: Some(rule.index),
        }
    }

    fn fallback(account: &str) -> Self {
        Self {
            account: account.to_string(),
            rule_name: None,
            rule_index: None,
        }
    }

    /// 是否来自兜底账户
    pub fn is_fallback(&self) -> bool {
        self.rule_index.is_none()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.rule_name, self.rule_index) {
            (Some(name), _) => write!(f, "{} [{}]", self.account, name),
            (None, Some(index)) => write!(f, "{} [#{}]", self.account, index),
            (None, None) => write!(f, "{} [default]", self.account),
        }
    }
}

/// 批量分类统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifyStats {
    pub total: usize,
    /// 由规则命中的交易数
    pub matched: usize,
    /// 由兜底账户接收的交易数
    pub fallback: usize,
    pub unmatched: usize,
    pub per_account: BTreeMap<String, usize>,
}

impl ClassifyStats {
    /// 由已有的分类结果汇总统计，不重复分类
    pub fn from_results(results: &[Option<Classification>]) -> Self {
        let mut stats = ClassifyStats {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            match result {
                Some(classification) => {
                    if classification.is_fallback() {
                        stats.fallback += 1;
                    } else {
                        stats.matched += 1;
                    }
                    *stats.per_account.entry(classification.account.clone()).or_insert(0) += 1;
                }
                None => stats.unmatched += 1,
            }
        }

        stats
    }
}

/// 账户分类器
#[derive(Debug, Clone)]
pub struct AccountClassifier {
    compiled: Arc<CompiledRuleSet>,
    config: ClassifierConfig,
}

impl AccountClassifier {
    /// 由已加载的规则创建分类器
    pub fn new(rules: &[AccountRule], config: ClassifierConfig) -> AccResult<Self> {
        let compiled = RuleCompiler::compile(rules, &config)?;
        Ok(Self {
            compiled: Arc::new(compiled),
            config,
        })
    }

    /// 由 JSON 规则文本创建分类器
    pub fn from_json(json: &str, config: ClassifierConfig) -> AccResult<Self> {
        let rules = RuleLoader::from_str(json)?;
        Self::new(&rules, config)
    }

    /// 由 JSON 规则文件创建分类器
    pub fn from_path<P: AsRef<Path>>(path: P, config: ClassifierConfig) -> AccResult<Self> {
        let rules = RuleLoader::from_path(path)?;
        Self::new(&rules, config)
    }

    pub fn rules(&self) -> &CompiledRuleSet {
        &self.compiled
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// 核心分类接口：首个命中规则胜出，无命中时回退到兜底账户
    pub fn classify(&self, transaction: &Transaction) -> Option<Classification> {
        if let Some(rule) = self.compiled.iter().find(|rule| rule.is_match(transaction)) {
            debug!(
                "规则命中：交易={}，规则={}，账户={}",
                transaction,
                rule.label(),
                rule.account
            );
            return Some(Classification::from_rule(rule));
        }

        let fallback = self.config.default_account.as_deref().map(Classification::fallback);
        if fallback.is_none() {
            debug!("无规则命中：交易={}", transaction);
        }
        fallback
    }

    /// 仅按描述分类
    pub fn classify_description(&self, description: &str) -> Option<Classification> {
        self.classify(&Transaction::new(description))
    }

    /// 所有命中的规则（按优先级顺序）
    pub fn matching_rules(&self, transaction: &Transaction) -> Vec<&CompiledAccountRule> {
        self.compiled
            .iter()
            .filter(|rule| rule.is_match(transaction))
            .collect()
    }

    /// 批量分类
    pub fn classify_all(&self, transactions: &[Transaction]) -> Vec<Option<Classification>> {
        transactions.iter().map(|tx| self.classify(tx)).collect()
    }

    /// 批量分类并统计
    pub fn summarize(&self, transactions: &[Transaction]) -> ClassifyStats {
        ClassifyStats::from_results(&self.classify_all(transactions))
    }
}
