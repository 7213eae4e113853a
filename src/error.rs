//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;

#[derive(Error, Debug)]
pub enum AccregexError {
    // 规则相关错误
    #[error("规则校验失败（第 {index} 条）：{reason}")]
    RuleValidationError { index: usize, reason: String },

    // 编译相关错误
    #[error("正则编译失败（规则 {rule}）：{source}")]
    RegexCompileError {
        rule: String,
        #[source]
        source: RegexError,
    },

    // 分类相关错误
    #[error("分类器未初始化")]
    ClassifierNotInitialized,

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("CSV解析失败：{0}")]
    CsvError(#[from] csv::Error),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

impl AccregexError {
    /// 构造规则校验错误
    pub(crate) fn invalid_rule(index: usize, reason: impl Into<String>) -> Self {
        AccregexError::RuleValidationError {
            index,
            reason: reason.into(),
        }
    }
}

// 全局Result类型
pub type AccResult<T> = Result<T, AccregexError>;
