//! 编译后模式模型
//! 规则编译后的可执行结构

use std::borrow::Cow;

use regex::Regex;

use crate::rule::MatchField;
use crate::transaction::Transaction;

#[derive(Debug, Clone)]
pub enum Matcher {
    Contains(String),   // 包含匹配
    StartsWith(String), // 前缀匹配
    Equals(String),     // 全等匹配
    Regex(Regex),       // 正则匹配
}

impl Matcher {
    /// 简单匹配判断
    /// `folded` 为按条件大小写策略处理后的输入，字符串匹配使用它，正则使用原始输入
    pub fn is_match(&self, input: &str, folded: &str) -> bool {
        match self {
            Matcher::Contains(s) => folded.contains(s.as_str()),
            Matcher::StartsWith(s) => folded.starts_with(s.as_str()),
            Matcher::Equals(s) => folded == s.as_str(),
            Matcher::Regex(regex) => regex.is_match(input),
        }
    }

    /// 规则描述，包含匹配类型与模式值
    pub fn describe(&self) -> String {
        match self {
            Matcher::Contains(s) => format!("contains {:?}", s),
            Matcher::StartsWith(s) => format!("starts_with {:?}", s),
            Matcher::Equals(s) => format!("equals {:?}", s),
            Matcher::Regex(r) => format!("regex /{}/", r.as_str()),
        }
    }
}

/// 编译后的字段条件
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub field: MatchField,
    pub matchers: Vec<Matcher>,
    pub ignore_case: bool,
}

impl CompiledCondition {
    /// 字段存在且任一模式命中
    pub fn is_match(&self, transaction: &Transaction) -> bool {
        let Some(input) = transaction.field(self.field) else {
            return false;
        };

        let folded = if self.ignore_case {
            Cow::Owned(input.to_lowercase())
        } else {
            Cow::Borrowed(input)
        };

        self.matchers.iter().any(|m| m.is_match(input, &folded))
    }
}

/// 编译后的匹配规格
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    All,
    Conditions(Vec<CompiledCondition>),
}

impl CompiledPattern {
    pub fn is_match(&self, transaction: &Transaction) -> bool {
        match self {
            CompiledPattern::All => true,
            CompiledPattern::Conditions(conditions) => {
                conditions.iter().all(|c| c.is_match(transaction))
            }
        }
    }
}

/// 账户规则编译后的结构
#[derive(Debug, Clone)]
pub struct CompiledAccountRule {
    pub name: Option<String>,
    pub account: String,
    /// 规则在原始文档中的位置
    pub index: usize,
    pub priority: i32,
    pub pattern: CompiledPattern,
}

impl CompiledAccountRule {
    pub fn is_match(&self, transaction: &Transaction) -> bool {
        self.pattern.is_match(transaction)
    }

    /// 日志中使用的规则标识
    pub fn label(&self) -> String {
        rule_label(self.name.as_deref(), self.index)
    }
}

/// 编译后的规则集（已按优先级排序）
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    pub rules: Vec<CompiledAccountRule>,
    /// 因编译失败被跳过的规则数（仅宽松模式）
    pub skipped: usize,
}

impl CompiledRuleSet {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledAccountRule> {
        self.rules.iter()
    }
}

pub(crate) fn rule_label(name: Option<&str>, index: usize) -> String {
    match name {
        Some(name) => name.to_string(),
        None => format!("#{}", index),
    }
}
