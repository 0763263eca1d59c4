//! 应用启动器构建器

use crate::beans::BeansBuilder;
use crate::errors::{ApplicationInitializeError, InitializeResult};
use crate::runner::ApplicationRunner;
use di_abstractions::{ContainerConfig, TypeDiscovery};
use di_impl::LinkedTypeCatalog;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 应用启动器构建器
///
/// 使用建造者模式组装启动器：类型发现服务、扫描范围、容器配置、预构建实例和日志。
pub struct RunnerBuilder {
    /// 类型发现服务，默认读取链接期类型目录
    discovery: Arc<dyn TypeDiscovery>,
    /// 扫描范围（模块路径前缀）
    scope: Option<String>,
    /// 容器配置
    container_config: ContainerConfig,
    /// 预构建实例
    beans: BeansBuilder,
    /// 日志配置，设置后在构建时初始化日志
    logging_config: Option<LoggingConfig>,
}

impl RunnerBuilder {
    /// 创建新的启动器构建器
    pub fn new() -> Self {
        Self {
            discovery: Arc::new(LinkedTypeCatalog::new()),
            scope: None,
            container_config: ContainerConfig::default(),
            beans: BeansBuilder::new(),
            logging_config: None,
        }
    }

    /// 设置类型发现服务
    pub fn with_discovery(mut self, discovery: Arc<dyn TypeDiscovery>) -> Self {
        debug!("使用类型发现服务: {}", discovery.name());
        self.discovery = discovery;
        self
    }

    /// 只在指定模块路径下查找候选类型
    pub fn with_scope<S: Into<String>>(mut self, scope: S) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// 设置容器配置
    pub fn with_container_config(mut self, config: ContainerConfig) -> Self {
        self.container_config = config;
        self
    }

    /// 从 TOML 或 JSON 文件加载容器配置
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> InitializeResult<Self> {
        let path = path.as_ref();
        info!("加载容器配置文件: {}", path.display());
        self.container_config = ContainerConfig::load(path)?;
        Ok(self)
    }

    /// 追加预构建实例和类型
    pub fn with_beans(mut self, configure: impl FnOnce(BeansBuilder) -> BeansBuilder) -> Self {
        self.beans = configure(self.beans);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 构建启动器
    pub fn build(self) -> InitializeResult<ApplicationRunner> {
        // 只有在明确配置了日志时才初始化日志，避免测试中重复初始化
        if let Some(logging) = &self.logging_config {
            init_logging(logging)?;
        }

        self.container_config.validate()?;
        Ok(ApplicationRunner::new(
            self.discovery,
            self.scope,
            self.container_config,
            self.beans,
        ))
    }
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令，优先于日志级别；未设置时读取 `RUST_LOG`
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// 设置过滤指令
    pub fn with_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    fn env_filter(&self) -> InitializeResult<EnvFilter> {
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).map_err(|e| {
                ApplicationInitializeError::LoggingInitFailed {
                    message: format!("无效的过滤指令 {}: {}", directives, e),
                }
            }),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()))),
        }
    }
}

/// 初始化日志系统
pub fn init_logging(config: &LoggingConfig) -> InitializeResult<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    }
    .map_err(|e| ApplicationInitializeError::LoggingInitFailed {
        message: e.to_string(),
    })?;

    info!("日志系统初始化完成");
    Ok(())
}
