//! 错误类型定义

use thiserror::Error;

/// 用户构造函数、启动方法和工厂方法返回的动态错误
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 配置文件读取失败
    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    /// TOML 或 JSON 解析失败
    #[error("配置解析失败 ({format}): {source}")]
    ParseError {
        format: &'static str,
        source: DynError,
    },

    /// 扩展名既不是 toml 也不是 json
    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },

    /// 配置值超出允许范围
    #[error("配置值无效: {key} = {value}, 期望: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}

impl ConfigError {
    /// 创建配置值无效错误
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(source: serde_json::Error) -> Self {
        Self::ParseError {
            format: "json",
            source: Box::new(source),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(source: toml::de::Error) -> Self {
        Self::ParseError {
            format: "toml",
            source: Box::new(source),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    /// 请求的类型没有注册
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    /// 命中注册但没有得到实例
    #[error("组件实例不可用: {type_name}")]
    ComponentUnavailable { type_name: String },

    /// 构造函数返回错误
    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed { type_name: String, source: DynError },

    /// 类型没有构造函数
    #[error("类型不可实例化: {type_name}")]
    NotInstantiable { type_name: String },

    /// 解析链上出现循环
    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    /// 解析链超过最大深度
    #[error("解析深度超出限制: {type_name}, 最大深度: {max_depth}")]
    ResolutionDepthExceeded { type_name: String, max_depth: usize },

    /// 依赖未解析到且缺失策略为失败
    #[error("缺少依赖: {owner} 需要 {dependency} (限定符: {qualifier})")]
    MissingDependency {
        owner: String,
        dependency: String,
        qualifier: String,
    },

    /// 实例无法转换为请求的类型
    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },
}

impl DependencyError {
    /// 创建组件创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, source: impl Into<DynError>) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 创建类型不匹配错误
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// 是否为解析过程中的结构性错误（循环依赖、深度超限）
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CircularDependency { .. } | Self::ResolutionDepthExceeded { .. }
        )
    }
}

/// 配置结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;
/// 依赖解析结果类型
pub type DependencyResult<T> = Result<T, DependencyError>;
