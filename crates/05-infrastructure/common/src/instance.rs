//! 类型擦除的组件实例
//!
//! [`Instance`] 内部持有一个 `Arc<T>`（`T` 可以是 trait 对象），因此具体类型与其
//! trait 别名可以指向同一块内存，并通过统一的 `downcast` 取回。

use crate::component::{Injectable, SupertypeDescriptor};
use crate::errors::DynError;
use crate::lifecycle::CreationStrategy;
use crate::metadata::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的组件实例
#[derive(Clone)]
pub struct Instance {
    info: TypeInfo,
    handle: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// 从共享指针创建实例
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        let handle: Arc<dyn Any + Send + Sync> = Arc::new(value);
        Self {
            info: TypeInfo::of::<T>(),
            handle,
        }
    }

    /// 从值创建实例
    pub fn from_value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// 实例的类型信息
    pub fn type_info(&self) -> TypeInfo {
        self.info
    }

    /// 转换为指定类型的共享指针
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        (*self.handle).downcast_ref::<Arc<T>>().cloned()
    }

    /// 是否持有指定类型
    pub fn is<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.info.is::<T>()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.info.name).finish()
    }
}

/// 已解析的构造参数或方法参数
///
/// 未解析到的参数为 `None`。
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Option<Instance>>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Self { values }
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 获取原始实例
    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// 获取指定位置的参数
    pub fn arg<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        self.get(index).and_then(Instance::downcast::<T>)
    }
}

impl From<Vec<Option<Instance>>> for Arguments {
    fn from(values: Vec<Option<Instance>>) -> Self {
        Self::new(values)
    }
}

/// 预构建的组件（Bean）
///
/// 直接注册到容器中的对象，解析时总是返回同一个实例。
#[derive(Clone)]
pub struct Bean {
    instance: Instance,
    supertypes: Vec<SupertypeDescriptor>,
    strategy: CreationStrategy,
    qualifier: Option<String>,
}

impl Bean {
    /// 从值创建 Bean，只注册在自身类型下
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// 从共享指针创建 Bean
    pub fn from_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::from_instance(Instance::new(value))
    }

    /// 从已擦除的实例创建 Bean
    pub fn from_instance(instance: Instance) -> Self {
        Self {
            instance,
            supertypes: Vec::new(),
            strategy: CreationStrategy::default(),
            qualifier: None,
        }
    }

    /// 从可注入类型的值创建 Bean，同时注册其声明的父类型并沿用其标记
    pub fn injectable<T: Injectable>(value: T) -> Self {
        let descriptor = T::type_descriptor();
        let mut bean = Self::new(value);
        bean.supertypes = descriptor.supertypes().to_vec();
        if let Some(marker) = descriptor.injectable() {
            bean.strategy = marker.strategy;
            bean.qualifier = marker.qualifier.clone();
        }
        bean
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 设置创建策略（预构建实例始终返回同一对象，策略仅作记录）
    pub fn with_strategy(mut self, strategy: CreationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// 额外注册一个父类型
    pub fn with_supertype(mut self, supertype: SupertypeDescriptor) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// 实例
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// 声明的父类型
    pub fn supertypes(&self) -> &[SupertypeDescriptor] {
        &self.supertypes
    }

    /// 创建策略
    pub fn strategy(&self) -> CreationStrategy {
        self.strategy
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("type", &self.instance.type_info().name)
            .field("strategy", &self.strategy)
            .field("qualifier", &self.qualifier)
            .field("supertypes", &self.supertypes.len())
            .finish()
    }
}

/// 工厂方法返回值到 Bean 的转换
pub trait IntoBean {
    /// 转换为可选的 Bean
    fn into_bean(self) -> Result<Option<Bean>, DynError>;
}

impl IntoBean for Bean {
    fn into_bean(self) -> Result<Option<Bean>, DynError> {
        Ok(Some(self))
    }
}

impl IntoBean for Option<Bean> {
    fn into_bean(self) -> Result<Option<Bean>, DynError> {
        Ok(self)
    }
}

impl<E: Into<DynError>> IntoBean for Result<Bean, E> {
    fn into_bean(self) -> Result<Option<Bean>, DynError> {
        self.map(Some).map_err(Into::into)
    }
}

impl<E: Into<DynError>> IntoBean for Result<Option<Bean>, E> {
    fn into_bean(self) -> Result<Option<Bean>, DynError> {
        self.map_err(Into::into)
    }
}

/// 方法调用返回值的统一转换
pub trait IntoInvocationResult {
    /// 转换为调用结果
    fn into_invocation_result(self) -> Result<(), DynError>;
}

impl IntoInvocationResult for () {
    fn into_invocation_result(self) -> Result<(), DynError> {
        Ok(())
    }
}

impl<E: Into<DynError>> IntoInvocationResult for Result<(), E> {
    fn into_invocation_result(self) -> Result<(), DynError> {
        self.map_err(Into::into)
    }
}
