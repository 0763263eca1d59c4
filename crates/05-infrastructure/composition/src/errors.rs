//! 启动错误类型

use infrastructure_common::{ConfigError, DependencyError, DynError};
use thiserror::Error;

/// 应用启动失败
///
/// 启动流程中的致命错误统一使用此类型，原始错误作为 `source` 保留。
#[derive(Error, Debug)]
pub enum ApplicationInitializeError {
    /// 扫描范围内没有带启动入口标记的类型
    #[error("未找到启动入口类型 (范围: {scope})")]
    EntryTypeNotFound {
        /// 扫描范围
        scope: String,
    },

    /// 入口类型没有标记指定的方法
    #[error("启动入口类型 {type_name} 没有方法 {method_name}")]
    EntryMethodNotFound {
        /// 入口类型名称
        type_name: String,
        /// 入口方法名称
        method_name: String,
    },

    /// 入口实例未注册、为空或创建失败
    #[error("无法创建启动入口实例: {type_name}")]
    EntryNotCreated {
        /// 入口类型名称
        type_name: String,
        /// 解析错误，实例仅为空时没有
        #[source]
        source: Option<DependencyError>,
    },

    /// 入口方法返回错误
    #[error("启动方法执行失败: {method_name}, 原因: {source}")]
    InvocationFailed {
        /// 入口方法名称
        method_name: String,
        /// 方法返回的原始错误
        #[source]
        source: DynError,
    },

    /// 依赖管理器错误
    #[error("依赖管理器错误: {0}")]
    Dependency(#[from] DependencyError),

    /// 容器配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 日志系统初始化失败
    #[error("日志初始化失败: {message}")]
    LoggingInitFailed {
        /// 失败原因
        message: String,
    },
}

/// 启动结果类型
pub type InitializeResult<T> = Result<T, ApplicationInitializeError>;
