//! 交易记录模型：分类器的输入

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::MatchField;

/// 待分类的交易
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(alias = "Description", alias = "Payee")]
    pub description: String,
    #[serde(default, alias = "Memo", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, alias = "Notes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 交易当前所在账户
    #[serde(default, alias = "Account", alias = "Account Name", skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Transaction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// 读取指定字段，缺失字段返回 None
    pub fn field(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Description => Some(&self.description),
            MatchField::Memo => self.memo.as_deref(),
            MatchField::Notes => self.notes.as_deref(),
            MatchField::Account => self.account.as_deref(),
        }
    }

    /// 空字符串的可选字段统一视为缺失
    pub fn normalized(mut self) -> Self {
        for value in [&mut self.memo, &mut self.notes, &mut self.account] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        self
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)?;
        if let Some(memo) = &self.memo {
            write!(f, " ({})", memo)?;
        }
        Ok(())
    }
}
