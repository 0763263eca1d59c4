//! 依赖管理器抽象接口
//!
//! 提供依赖管理器的核心抽象和容器配置

use crate::registry::RegistrationInfo;
use crate::resolver::{Resolution, DEFAULT_MAX_RESOLUTION_DEPTH};
use infrastructure_common::{
    Bean, ConfigError, CreationStrategy, DependencyError, Injectable, Instance, TypeDescriptor,
    TypeInfo,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

/// 依赖管理器 trait
///
/// 对象安全的核心接口，泛型便捷方法见 [`DependencyManagerExt`]。
pub trait DependencyManager: Send + Sync {
    /// 注册候选类型，返回本次新声明的注册数量
    fn initialize(&self) -> usize {
        self.initialize_with(Vec::new())
    }

    /// 注册候选类型以及额外指定的类型（额外类型不要求可注入标记）
    fn initialize_with(&self, extra_types: Vec<TypeDescriptor>) -> usize;

    /// 是否已完成初始化
    fn is_initialized(&self) -> bool;

    /// 注册预构建的实例
    fn add_instance(&self, bean: Bean);

    /// 记录一个类型，在下一次初始化时作为候选类型处理
    fn add_type(&self, descriptor: TypeDescriptor);

    /// 解析依赖，结构性错误和失败策略为 `Fail` 的错误会返回 `Err`
    fn try_resolve(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> Result<Resolution, DependencyError>;

    /// 解析依赖，错误会被记录并视为命中但无实例
    fn resolve(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> Resolution {
        match self.try_resolve(type_info, qualifier) {
            Ok(resolution) => resolution,
            Err(e) => {
                error!("依赖解析失败: {}, 原因: {}", type_info.name, e);
                Resolution::hit(None, *type_info)
            }
        }
    }

    /// 创建类型实例但不注册
    fn create(&self, descriptor: &TypeDescriptor) -> Result<Option<Instance>, DependencyError>;

    /// 所有已注册的请求类型名称（排序后）
    fn registered_names(&self) -> Vec<String>;

    /// 所有注册信息快照
    fn registrations(&self) -> Vec<RegistrationInfo>;
}

/// 依赖管理器泛型便捷方法
pub trait DependencyManagerExt: DependencyManager {
    /// 解析指定类型
    fn get<T: ?Sized + 'static>(&self) -> Resolution {
        self.resolve(&TypeInfo::of::<T>(), None)
    }

    /// 解析指定类型，返回结构性错误
    fn try_get<T: ?Sized + 'static>(&self) -> Result<Resolution, DependencyError> {
        self.try_resolve(&TypeInfo::of::<T>(), None)
    }

    /// 按限定符解析指定类型
    fn get_qualified<T: ?Sized + 'static>(&self, qualifier: &str) -> Resolution {
        self.resolve(&TypeInfo::of::<T>(), Some(qualifier))
    }

    /// 解析并取出指定类型的实例
    fn get_instance<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get::<T>().value::<T>()
    }

    /// 解析指定类型，未注册或无实例时返回错误
    fn require<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        let type_info = TypeInfo::of::<T>();
        let resolution = self.try_resolve(&type_info, None)?;
        if !resolution.found() {
            return Err(DependencyError::ComponentNotRegistered {
                type_name: type_info.name.to_string(),
            });
        }
        resolution
            .value::<T>()
            .ok_or_else(|| DependencyError::ComponentUnavailable {
                type_name: type_info.name.to_string(),
            })
    }

    /// 注册预构建的实例
    fn add_dependency<T: Send + Sync + 'static>(&self, value: T) {
        self.add_instance(Bean::new(value));
    }

    /// 按策略和限定符注册预构建的实例
    fn add_dependency_with<T: Send + Sync + 'static>(
        &self,
        value: T,
        strategy: CreationStrategy,
        qualifier: &str,
    ) {
        self.add_instance(
            Bean::new(value)
                .with_strategy(strategy)
                .with_qualifier(qualifier),
        );
    }

    /// 注册共享指针实例（可以是 trait 对象）
    fn add_dependency_arc<T: ?Sized + Send + Sync + 'static>(&self, value: Arc<T>) {
        self.add_instance(Bean::from_arc(value));
    }

    /// 注册可注入类型的实例，同时注册其父类型
    fn add_injectable<T: Injectable>(&self, value: T) {
        self.add_instance(Bean::injectable(value));
    }

    /// 记录可注入类型，在下一次初始化时注册
    fn add_type_of<T: Injectable>(&self) {
        self.add_type(T::type_descriptor());
    }
}

impl<M: DependencyManager + ?Sized> DependencyManagerExt for M {}

/// 失败处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 静默处理为缺失
    Silent,
    /// 记录警告并处理为缺失
    Warn,
    /// 返回错误
    Fail,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Warn
    }
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 依赖缺失时的处理策略
    pub missing_dependency: FailurePolicy,
    /// 构造失败时的处理策略
    pub construction_error: FailurePolicy,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 是否将容器自身注册为依赖
    pub register_self: bool,
    /// 是否隐式注册依赖声明中携带描述符的类型
    pub implicit_registration: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            missing_dependency: FailurePolicy::Warn,
            construction_error: FailurePolicy::Warn,
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            register_self: true,
            implicit_registration: true,
        }
    }
}

impl ContainerConfig {
    /// 创建严格模式配置，缺失和构造失败都返回错误
    pub fn strict() -> Self {
        Self {
            missing_dependency: FailurePolicy::Fail,
            construction_error: FailurePolicy::Fail,
            ..Self::default()
        }
    }

    /// 设置依赖缺失策略
    pub fn with_missing_dependency(mut self, policy: FailurePolicy) -> Self {
        self.missing_dependency = policy;
        self
    }

    /// 设置构造失败策略
    pub fn with_construction_error(mut self, policy: FailurePolicy) -> Self {
        self.construction_error = policy;
        self
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 设置是否注册容器自身
    pub fn with_register_self(mut self, enabled: bool) -> Self {
        self.register_self = enabled;
        self
    }

    /// 设置是否启用隐式注册
    pub fn with_implicit_registration(mut self, enabled: bool) -> Self {
        self.implicit_registration = enabled;
        self
    }

    /// 从 TOML 字符串加载
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载，按扩展名选择格式
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::invalid_value(
                "max_resolution_depth",
                "0",
                "大于 0 的整数",
            ));
        }
        Ok(())
    }
}
