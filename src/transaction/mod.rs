//! 交易模块：分类输入的数据模型与读取工具
pub mod model;
pub mod reader;

pub use self::model::Transaction;
pub use self::reader::TransactionReader;
