//! 账户规则数据模型定义
//! 仅存储规则数据，无任何匹配逻辑，支持序列化/反序列化

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccResult, AccregexError};

/// 可匹配的交易字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchField {
    Description,
    Memo,
    Notes,
    /// 交易当前所在账户（来源账户）
    Account,
}

impl MatchField {
    pub const ALL: [MatchField; 4] = [
        MatchField::Description,
        MatchField::Memo,
        MatchField::Notes,
        MatchField::Account,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchField::Description => "description",
            MatchField::Memo => "memo",
            MatchField::Notes => "notes",
            MatchField::Account => "account",
        }
    }
}

impl FromStr for MatchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        MatchField::ALL
            .into_iter()
            .find(|field| field.as_str() == lowered)
            .ok_or_else(|| {
                format!(
                    "未知的匹配字段 `{}`，可选值：description / memo / notes / account",
                    s
                )
            })
    }
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个匹配模式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Regex(String),      // 正则匹配
    Contains(String),   // 包含匹配
    StartsWith(String), // 前缀匹配
    Equals(String),     // 全等匹配
}

impl PatternKind {
    /// 模式原文
    pub fn value(&self) -> &str {
        match self {
            PatternKind::Regex(s)
            | PatternKind::Contains(s)
            | PatternKind::StartsWith(s)
            | PatternKind::Equals(s) => s,
        }
    }

    /// 模式类型名称
    pub fn kind_name(&self) -> &'static str {
        match self {
            PatternKind::Regex(_) => "regex",
            PatternKind::Contains(_) => "contains",
            PatternKind::StartsWith(_) => "starts_with",
            PatternKind::Equals(_) => "equals",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Regex(s) => write!(f, "~/{}/", s),
            other => write!(f, "{} {:?}", other.kind_name(), other.value()),
        }
    }
}

/// 单字段匹配条件：任一模式命中即成立
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCondition {
    field: MatchField,
    matchers: Vec<PatternKind>,
}

impl FieldCondition {
    /// 构造字段条件，模式列表不能为空
    pub fn new(field: MatchField, matchers: Vec<PatternKind>) -> AccResult<Self> {
        if matchers.is_empty() {
            return Err(AccregexError::InvalidInput(format!("字段 {} 的模式列表为空", field)));
        }
        Ok(Self { field, matchers })
    }

    /// 单正则条件的快捷构造
    pub fn regex(field: MatchField, pattern: impl Into<String>) -> Self {
        Self {
            field,
            matchers: vec![PatternKind::Regex(pattern.into())],
        }
    }

    pub fn field(&self) -> MatchField {
        self.field
    }

    pub fn matchers(&self) -> &[PatternKind] {
        &self.matchers
    }
}

impl fmt::Display for FieldCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.matchers.iter().map(|m| m.to_string()).collect();
        write!(f, "{} {}", self.field, parts.join(" | "))
    }
}

/// 规则匹配规格：通配（匹配全部）或字段条件组（全部成立才命中）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatchPattern {
    #[default]
    All,
    Conditions(Vec<FieldCondition>),
}

impl MatchPattern {
    /// 由条件列表构造，空列表视为通配
    pub fn from_conditions(mut conditions: Vec<FieldCondition>) -> Self {
        if conditions.is_empty() {
            return MatchPattern::All;
        }
        conditions.sort_by_key(|c| c.field);
        MatchPattern::Conditions(conditions)
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, MatchPattern::All)
    }

    pub fn conditions(&self) -> &[FieldCondition] {
        match self {
            MatchPattern::All => &[],
            MatchPattern::Conditions(conditions) => conditions,
        }
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPattern::All => f.write_str("*"),
            MatchPattern::Conditions(conditions) => {
                let parts: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                f.write_str(&parts.join(" & "))
            }
        }
    }
}

/// 账户规则：匹配规格 + 目标账户
/// 加载后不可变，所有字段通过访问器读取
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleEntry", into = "RuleEntry")]
pub struct AccountRule {
    name: Option<String>,
    account: String,
    pattern: MatchPattern,
    priority: i32,
    case_insensitive: bool,
}

impl AccountRule {
    /// 构造规则：账户去除首尾空白，条件按字段排序，空条件组视为通配
    pub fn new(account: impl AsRef<str>, pattern: MatchPattern) -> AccResult<Self> {
        let conditions = match pattern {
            MatchPattern::All => Vec::new(),
            MatchPattern::Conditions(conditions) => conditions,
        };
        let (account, pattern) =
            normalize_rule_parts(account.as_ref(), conditions).map_err(AccregexError::InvalidInput)?;

        Ok(Self {
            name: None,
            account,
            pattern,
            priority: 0,
            case_insensitive: false,
        })
    }

    /// 通配规则（兜底规则）
    pub fn match_all(account: impl AsRef<str>) -> AccResult<Self> {
        Self::new(account, MatchPattern::All)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn pattern(&self) -> &MatchPattern {
        &self.pattern
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn is_match_all(&self) -> bool {
        self.pattern.is_match_all()
    }
}

impl fmt::Display for AccountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "[{}] ", name)?;
        }
        write!(f, "{} -> {}", self.pattern, self.account)?;
        if self.priority != 0 {
            write!(f, " (priority {})", self.priority)?;
        }
        Ok(())
    }
}

// ======== 原始 JSON 结构 ========

/// 带类型标记的模式：`{"contains": "..."}` 等
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedPattern {
    Regex(String),
    Contains(String),
    StartsWith(String),
    Equals(String),
}

/// 列表中的单项：字符串视为正则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternItem {
    Regex(String),
    Typed(TypedPattern),
}

/// 字段模式规格：字符串 / 带类型对象 / 任一命中的列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Regex(String),
    Typed(TypedPattern),
    AnyOf(Vec<PatternItem>),
}

impl From<TypedPattern> for PatternKind {
    fn from(typed: TypedPattern) -> Self {
        match typed {
            TypedPattern::Regex(s) => PatternKind::Regex(s),
            TypedPattern::Contains(s) => PatternKind::Contains(s),
            TypedPattern::StartsWith(s) => PatternKind::StartsWith(s),
            TypedPattern::Equals(s) => PatternKind::Equals(s),
        }
    }
}

impl From<PatternItem> for PatternKind {
    fn from(item: PatternItem) -> Self {
        match item {
            PatternItem::Regex(s) => PatternKind::Regex(s),
            PatternItem::Typed(typed) => typed.into(),
        }
    }
}

impl From<PatternKind> for PatternItem {
    fn from(kind: PatternKind) -> Self {
        match kind {
            PatternKind::Regex(s) => PatternItem::Regex(s),
            PatternKind::Contains(s) => PatternItem::Typed(TypedPattern::Contains(s)),
            PatternKind::StartsWith(s) => PatternItem::Typed(TypedPattern::StartsWith(s)),
            PatternKind::Equals(s) => PatternItem::Typed(TypedPattern::Equals(s)),
        }
    }
}

impl PatternSpec {
    fn into_kinds(self) -> Vec<PatternKind> {
        match self {
            PatternSpec::Regex(s) => vec![PatternKind::Regex(s)],
            PatternSpec::Typed(typed) => vec![typed.into()],
            PatternSpec::AnyOf(items) => items.into_iter().map(PatternKind::from).collect(),
        }
    }

    fn from_kinds(mut kinds: Vec<PatternKind>) -> Self {
        if kinds.len() == 1 {
            return match PatternItem::from(kinds.remove(0)) {
                PatternItem::Regex(s) => PatternSpec::Regex(s),
                PatternItem::Typed(typed) => PatternSpec::Typed(typed),
            };
        }
        PatternSpec::AnyOf(kinds.into_iter().map(PatternItem::from).collect())
    }
}

/// 规则条目（JSON 原始形态）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "Account")]
    pub account: Option<String>,
    /// `match.description` 的简写
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternSpec>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<BTreeMap<String, PatternSpec>>,
    #[serde(default, skip_serializing_if = "is_default_priority")]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub case_insensitive: bool,
}

// ======== 辅助函数：默认值不序列化 ========
fn is_default_priority(priority: &i32) -> bool {
    *priority == 0
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl RuleEntry {
    /// 校验并转换为账户规则，`index` 为条目在文档中的位置
    pub fn into_rule(self, index: usize) -> AccResult<AccountRule> {
        let Some(account) = self.account else {
            return Err(AccregexError::invalid_rule(index, "缺少必填字段 account"));
        };

        let mut conditions: Vec<FieldCondition> = Vec::new();
        if let Some(spec) = self.pattern {
            conditions.push(Self::build_condition(index, MatchField::Description, spec)?);
        }

        for (key, spec) in self.conditions.unwrap_or_default() {
            let field = key
                .parse::<MatchField>()
                .map_err(|reason| AccregexError::invalid_rule(index, reason))?;
            if conditions.iter().any(|c| c.field == field) {
                return Err(AccregexError::invalid_rule(
                    index,
                    format!("字段 {} 重复定义（pattern 与 match.description 不能同时使用）", field),
                ));
            }
            conditions.push(Self::build_condition(index, field, spec)?);
        }

        let (account, pattern) = normalize_rule_parts(&account, conditions)
            .map_err(|reason| AccregexError::invalid_rule(index, reason))?;

        Ok(AccountRule {
            name: self.name,
            account,
            pattern,
            priority: self.priority,
            case_insensitive: self.case_insensitive,
        })
    }

    fn build_condition(index: usize, field: MatchField, spec: PatternSpec) -> AccResult<FieldCondition> {
        let matchers = spec.into_kinds();
        if matchers.is_empty() {
            return Err(AccregexError::invalid_rule(
                index,
                format!("字段 {} 的模式列表为空", field),
            ));
        }
        Ok(FieldCondition { field, matchers })
    }
}

/// 校验目标账户并规范化条件组：账户不能为空，同一字段只能出现一次
fn normalize_rule_parts(
    account: &str,
    conditions: Vec<FieldCondition>,
) -> Result<(String, MatchPattern), String> {
    let account = account.trim();
    if account.is_empty() {
        return Err("account 不能为空".to_string());
    }

    for (i, condition) in conditions.iter().enumerate() {
        if conditions[..i].iter().any(|c| c.field == condition.field) {
            return Err(format!("字段 {} 重复定义", condition.field));
        }
    }

    Ok((account.to_string(), MatchPattern::from_conditions(conditions)))
}

impl TryFrom<RuleEntry> for AccountRule {
    type Error = AccregexError;

    fn try_from(entry: RuleEntry) -> Result<Self, Self::Error> {
        entry.into_rule(0)
    }
}

// ======== 类型转换：规则 -> 规范化 JSON 条目 ========
impl From<AccountRule> for RuleEntry {
    fn from(rule: AccountRule) -> Self {
        let conditions = match rule.pattern {
            MatchPattern::All => None,
            MatchPattern::Conditions(conditions) => Some(
                conditions
                    .into_iter()
                    .map(|c| (c.field.as_str().to_string(), PatternSpec::from_kinds(c.matchers)))
                    .collect(),
            ),
        };

        Self {
            name: rule.name,
            account: Some(rule.account),
            pattern: None,
            conditions,
            priority: rule.priority,
            case_insensitive: rule.case_insensitive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> RuleEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_entry_without_pattern_is_match_all() {
        let rule = entry(r#"{"account": "Expenses:Misc"}"#).into_rule(0).unwrap();
        assert!(rule.is_match_all());
        assert_eq!(rule.account(), "Expenses:Misc");
        assert_eq!(rule.priority(), 0);
    }

    #[test]
    fn test_empty_match_object_is_match_all() {
        let rule = entry(r#"{"account": "A", "match": {}}"#).into_rule(0).unwrap();
        assert_eq!(rule.pattern(), &MatchPattern::All);
    }

    #[test]
    fn test_pattern_shorthand_targets_description() {
        let rule = entry(r#"{"account": "A", "pattern": "^POS"}"#).into_rule(0).unwrap();
        assert_eq!(
            rule.pattern().conditions(),
            &[FieldCondition::regex(MatchField::Description, "^POS")]
        );
    }

    #[test]
    fn test_typed_and_list_patterns() {
        let rule = entry(
            r#"{
                "account": "A",
                "match": {
                    "memo": {"starts_with": "card"},
                    "description": ["^POS", {"contains": "market"}]
                }
            }"#,
        )
        .into_rule(0)
        .unwrap();

        let conditions = rule.pattern().conditions();
        assert_eq!(conditions.len(), 2);
        // 条件按字段排序
        assert_eq!(conditions[0].field(), MatchField::Description);
        assert_eq!(
            conditions[0].matchers(),
            &[
                PatternKind::Regex("^POS".to_string()),
                PatternKind::Contains("market".to_string())
            ]
        );
        assert_eq!(conditions[1].matchers(), &[PatternKind::StartsWith("card".to_string())]);
    }

    #[test]
    fn test_capitalized_account_alias() {
        let rule = entry(r#"{"Account": "Income:Salary"}"#).into_rule(0).unwrap();
        assert_eq!(rule.account(), "Income:Salary");
    }

    #[test]
    fn test_blank_account_rejected() {
        let err = entry(r#"{"account": "   "}"#).into_rule(3).unwrap_err();
        assert!(matches!(err, AccregexError::RuleValidationError { index: 3, .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = entry(r#"{"account": "A", "match": {"payee": "x"}}"#).into_rule(0).unwrap_err();
        assert!(matches!(err, AccregexError::RuleValidationError { .. }));
    }

    #[test]
    fn test_empty_pattern_list_rejected() {
        let err = entry(r#"{"account": "A", "match": {"memo": []}}"#).into_rule(0).unwrap_err();
        assert!(matches!(err, AccregexError::RuleValidationError { .. }));
    }

    #[test]
    fn test_pattern_and_match_description_conflict() {
        let err = entry(r#"{"account": "A", "pattern": "x", "match": {"description": "y"}}"#)
            .into_rule(0)
            .unwrap_err();
        assert!(matches!(err, AccregexError::RuleValidationError { .. }));
    }

    #[test]
    fn test_display() {
        let rule = AccountRule::new(
            "Expenses:Fuel",
            MatchPattern::from_conditions(vec![FieldCondition::regex(MatchField::Description, "Z Energy")]),
        )
        .unwrap()
        .with_name("fuel")
        .with_priority(2);
        assert_eq!(rule.to_string(), "[fuel] description ~/Z Energy/ -> Expenses:Fuel (priority 2)");
        assert_eq!(AccountRule::match_all("A").unwrap().to_string(), "* -> A");
    }

    #[test]
    fn test_new_normalizes_conditions_and_account() {
        let rule = AccountRule::new(
            "  Expenses:Misc ",
            MatchPattern::Conditions(vec![
                FieldCondition::regex(MatchField::Account, "Unspecified"),
                FieldCondition::regex(MatchField::Description, "x"),
            ]),
        )
        .unwrap();

        assert_eq!(rule.account(), "Expenses:Misc");
        let fields: Vec<_> = rule.pattern().conditions().iter().map(|c| c.field()).collect();
        assert_eq!(fields, vec![MatchField::Description, MatchField::Account]);

        let empty = AccountRule::new("A", MatchPattern::Conditions(Vec::new())).unwrap();
        assert!(empty.is_match_all());
    }

    #[test]
    fn test_new_rejects_invalid_parts() {
        assert!(matches!(
            FieldCondition::new(MatchField::Memo, Vec::new()),
            Err(AccregexError::InvalidInput(_))
        ));
        assert!(matches!(AccountRule::match_all("  "), Err(AccregexError::InvalidInput(_))));

        let duplicated = MatchPattern::Conditions(vec![
            FieldCondition::regex(MatchField::Memo, "a"),
            FieldCondition::regex(MatchField::Memo, "b"),
        ]);
        assert!(matches!(AccountRule::new("A", duplicated), Err(AccregexError::InvalidInput(_))));
    }
}
