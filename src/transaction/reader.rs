//! 交易读取工具
//! 支持 CSV（带表头）与 JSON 数组两种输入

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use super::model::Transaction;
use crate::error::AccResult;

/// 交易读取器
pub struct TransactionReader;

impl TransactionReader {
    /// 读取 CSV，表头需包含 description，可选 memo / notes / account
    pub fn from_csv_reader<R: Read>(reader: R) -> AccResult<Vec<Transaction>> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut transactions = Vec::new();
        for record in csv_reader.deserialize() {
            let transaction: Transaction = record?;
            transactions.push(transaction.normalized());
        }

        debug!("CSV 读取交易 {} 条", transactions.len());
        Ok(transactions)
    }

    pub fn from_csv_str(text: &str) -> AccResult<Vec<Transaction>> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// 读取 JSON 交易数组
    pub fn from_json_str(json: &str) -> AccResult<Vec<Transaction>> {
        let transactions: Vec<Transaction> = serde_json::from_str(json)?;
        Ok(transactions.into_iter().map(Transaction::normalized).collect())
    }

    /// 按扩展名选择格式：`.json` 为 JSON，其余按 CSV 处理
    pub fn from_path<P: AsRef<Path>>(path: P) -> AccResult<Vec<Transaction>> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            let text = std::fs::read_to_string(path)?;
            Self::from_json_str(&text)
        } else {
            let file = File::open(path)?;
            Self::from_csv_reader(BufReader::new(file))
        }
    }
}
