//! 全局配置管理，存储分类器的所有可配置项

/// 分类器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    // 是否对所有规则强制忽略大小写
    pub case_insensitive: bool,
    // 无规则命中时使用的兜底账户
    pub default_account: Option<String>,
    // 严格模式：正则编译失败即报错；关闭后跳过该规则
    pub strict: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            default_account: None,
            strict: true,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: ClassifierConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.config.case_insensitive = case_insensitive;
        self
    }

    pub fn default_account(mut self, account: impl Into<String>) -> Self {
        self.config.default_account = Some(account.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn build(self) -> ClassifierConfig {
        self.config
    }
}
