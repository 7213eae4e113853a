//! 全局分类器单例管理
use once_cell::sync::OnceCell;

use super::classifier::{AccountClassifier, Classification};
use crate::config::ClassifierConfig;
use crate::error::{AccResult, AccregexError};
use crate::transaction::Transaction;

/// 全局分类器实例
static GLOBAL_CLASSIFIER: OnceCell<AccountClassifier> = OnceCell::new();

/// 用 JSON 规则初始化全局分类器，重复调用直接返回
pub fn init_classifier(json: &str, config: ClassifierConfig) -> AccResult<()> {
    if GLOBAL_CLASSIFIER.get().is_some() {
        return Ok(());
    }

    let classifier = AccountClassifier::from_json(json, config)?;
    // 并发初始化时以先写入者为准
    let _ = GLOBAL_CLASSIFIER.set(classifier);

    Ok(())
}

/// 使用全局分类器分类交易
pub fn classify_transaction(transaction: &Transaction) -> AccResult<Option<Classification>> {
    Ok(get_global_classifier()?.classify(transaction))
}

/// 获取全局分类器
pub(crate) fn get_global_classifier() -> AccResult<&'static AccountClassifier> {
    GLOBAL_CLASSIFIER
        .get()
        .ok_or(AccregexError::ClassifierNotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;

    #[test]
    fn test_global_lifecycle() {
        let tx = Transaction::new("SAFEWAY #12");
        assert!(matches!(
            classify_transaction(&tx),
            Err(AccregexError::ClassifierNotInitialized)
        ));

        init_classifier(
            r#"[{"account": "Expenses:Groceries", "pattern": "SAFEWAY"}]"#,
            ConfigManager::get_default(),
        )
        .unwrap();
        // 二次初始化不替换已有实例
        init_classifier(r#"[{"account": "Other"}]"#, ConfigManager::get_default()).unwrap();

        let result = classify_transaction(&tx).unwrap().unwrap();
        assert_eq!(result.account, "Expenses:Groceries");
        assert_eq!(classify_transaction(&Transaction::new("rent")).unwrap(), None);
    }
}
