//! 规则加载管理器
//! 负责从 JSON 文本 / 读取器 / 本地文件加载账户规则，并支持规范化回写

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::model::{AccountRule, PatternSpec, RuleEntry};
use crate::error::{AccResult, AccregexError};

/// 包装对象中存放规则数组的键名
const RULES_KEY: &str = "rules";

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 从 JSON 文本加载规则
    pub fn from_str(json: &str) -> AccResult<Vec<AccountRule>> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// 从任意读取器加载规则
    pub fn from_reader<R: Read>(reader: R) -> AccResult<Vec<AccountRule>> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    /// 从本地文件加载规则
    pub fn from_path<P: AsRef<Path>>(path: P) -> AccResult<Vec<AccountRule>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let rules = Self::from_reader(BufReader::new(file))?;
        debug!("从文件 {} 加载规则 {} 条", path.display(), rules.len());
        Ok(rules)
    }

    /// 从已解析的 JSON 值加载规则
    ///
    /// 支持三种根节点：
    /// - 规则数组：`[ {...}, ... ]`
    /// - 包装对象：`{ "rules": [ ... ] }`
    /// - 以规则标识为键的映射：`{ "groceries": {...}, ... }`，键名作为规则名称
    pub fn from_value(value: Value) -> AccResult<Vec<AccountRule>> {
        let entries = Self::collect_entries(value)?;

        let rules = entries
            .into_iter()
            .enumerate()
            .map(|(index, (key, entry))| Self::parse_entry(index, key, entry))
            .collect::<AccResult<Vec<_>>>()?;

        let match_all_count = rules.iter().filter(|r| r.is_match_all()).count();
        debug!("规则加载完成：共 {} 条，其中通配规则 {} 条", rules.len(), match_all_count);

        Ok(rules)
    }

    /// 将规则规范化序列化为 JSON 数组
    pub fn to_json(rules: &[AccountRule]) -> AccResult<String> {
        Ok(serde_json::to_string_pretty(rules)?)
    }

    /// 展开根节点为 (键名, 条目) 列表
    fn collect_entries(value: Value) -> AccResult<Vec<(Option<String>, Value)>> {
        match value {
            Value::Array(items) => Ok(items.into_iter().map(|item| (None, item)).collect()),
            Value::Object(mut map) => {
                if matches!(map.get(RULES_KEY), Some(Value::Array(_))) {
                    // 包装对象只允许 rules 一个键，其余键不会被静默丢弃
                    let extra: Vec<&str> = map
                        .keys()
                        .map(String::as_str)
                        .filter(|key| *key != RULES_KEY)
                        .collect();
                    if !extra.is_empty() {
                        return Err(AccregexError::invalid_rule(
                            0,
                            format!("包装对象中除 rules 外不允许其他键：{}", extra.join(", ")),
                        ));
                    }
                    if let Some(Value::Array(items)) = map.remove(RULES_KEY) {
                        return Ok(items.into_iter().map(|item| (None, item)).collect());
                    }
                }
                Ok(map.into_iter().map(|(key, item)| (Some(key), item)).collect())
            }
            other => Err(AccregexError::invalid_rule(
                0,
                format!("文档根节点必须是数组或对象，实际为 {}", json_type_name(&other)),
            )),
        }
    }

    /// 解析单条规则
    fn parse_entry(index: usize, key: Option<String>, value: Value) -> AccResult<AccountRule> {
        let Value::Object(map) = &value else {
            return Err(AccregexError::invalid_rule(
                index,
                format!("规则条目必须是对象，实际为 {}", json_type_name(&value)),
            ));
        };
        Self::check_pattern_specs(index, map)?;

        let mut entry: RuleEntry = serde_json::from_value(value)
            .map_err(|e| AccregexError::invalid_rule(index, e.to_string()))?;
        if entry.name.is_none() {
            entry.name = key;
        }

        entry.into_rule(index)
    }

    /// 预先校验 pattern 与 match.* 的模式格式，报错时指明字段
    fn check_pattern_specs(index: usize, map: &Map<String, Value>) -> AccResult<()> {
        if let Some(spec) = map.get("pattern").filter(|v| !v.is_null()) {
            Self::check_pattern_spec(index, "pattern", spec)?;
        }
        if let Some(Value::Object(fields)) = map.get("match") {
            for (key, spec) in fields {
                Self::check_pattern_spec(index, &format!("match.{}", key), spec)?;
            }
        }
        Ok(())
    }

    fn check_pattern_spec(index: usize, field: &str, spec: &Value) -> AccResult<()> {
        PatternSpec::deserialize(spec).map(|_| ()).map_err(|_| {
            AccregexError::invalid_rule(
                index,
                format!(
                    "字段 {} 的模式格式无效（实际为 {}）：应为正则字符串、\
                     {{\"regex\"|\"contains\"|\"starts_with\"|\"equals\": \"...\"}} 对象，或由它们组成的列表",
                    field,
                    json_type_name(spec)
                ),
            )
        })
    }
}

impl AccountRule {
    /// 从 JSON 文本读取账户规则列表
    pub fn read_account_rules(json: &str) -> AccResult<Vec<AccountRule>> {
        RuleLoader::from_str(json)
    }
}

/// 从 JSON 文本读取账户规则列表
pub fn read_account_rules(json: &str) -> AccResult<Vec<AccountRule>> {
    RuleLoader::from_str(json)
}

/// 将账户规则列表写出为规范化 JSON
pub fn write_account_rules(rules: &[AccountRule]) -> AccResult<String> {
    RuleLoader::to_json(rules)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
