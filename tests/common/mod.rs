//! 测试共用的规则与交易样例
#![allow(dead_code)]

use tracing_subscriber::EnvFilter;

/// 安装测试用日志订阅器，输出交由测试框架捕获；重复调用无副作用
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// 单条未指定匹配条件的通配规则
pub const MATCH_ALL_UNSPECIFIED_JSON: &str = r#"[
    {"account": "Expenses:Unspecified"}
]"#;

/// 以规则标识为键的映射文档
pub const KEYED_RULES_JSON: &str = r#"{
    "groceries": {"account": "Expenses:Groceries", "pattern": "/safeway|countdown/i"},
    "fuel": {"account": "Expenses:Fuel", "match": {"description": {"starts_with": "Z Energy"}}},
    "salary": {"account": "Income:Salary", "priority": 10,
               "match": {"description": "ACME", "account": {"equals": "Assets:Checking"}}},
    "catch-all": {"account": "Expenses:Unspecified", "priority": -100}
}"#;

pub const TRANSACTIONS_CSV: &str = "\
Description,Memo,Notes,Account
COUNTDOWN PONSONBY,card 4421,,Unspecified
Z Energy Parnell,,,Unspecified
ACME LTD SALARY,,monthly,Assets:Checking
ACME LTD REFUND,,,Unspecified
Rent,,,Unspecified
";
