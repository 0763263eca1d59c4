//! 启动前追加的预构建实例和类型

use infrastructure_common::{Bean, CreationStrategy, Injectable, TypeDescriptor};
use std::sync::Arc;

/// 预构建实例构建器
///
/// 启动器在依赖管理器初始化之前注册这里收集的实例，并把类型作为额外候选类型。
#[derive(Debug, Clone, Default)]
pub struct BeansBuilder {
    beans: Vec<Bean>,
    types: Vec<TypeDescriptor>,
}

impl BeansBuilder {
    /// 创建空的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加预构建实例
    pub fn add_bean(mut self, bean: Bean) -> Self {
        self.beans.push(bean);
        self
    }

    /// 添加值，注册在自身类型下
    pub fn add_dependency<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.add_bean(Bean::new(value))
    }

    /// 按策略和限定符添加值
    pub fn add_dependency_with<T: Send + Sync + 'static>(
        self,
        value: T,
        strategy: CreationStrategy,
        qualifier: &str,
    ) -> Self {
        self.add_bean(
            Bean::new(value)
                .with_strategy(strategy)
                .with_qualifier(qualifier),
        )
    }

    /// 添加共享指针（可以是 trait 对象）
    pub fn add_arc<T: ?Sized + Send + Sync + 'static>(self, value: Arc<T>) -> Self {
        self.add_bean(Bean::from_arc(value))
    }

    /// 添加可注入类型的值，同时注册其父类型
    pub fn add_injectable<T: Injectable>(self, value: T) -> Self {
        self.add_bean(Bean::injectable(value))
    }

    /// 添加额外的候选类型（不要求可注入标记）
    pub fn add_type<T: Injectable>(self) -> Self {
        self.add_descriptor(T::type_descriptor())
    }

    /// 添加额外的类型描述符
    pub fn add_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// 已添加的预构建实例
    pub fn beans(&self) -> &[Bean] {
        &self.beans
    }

    /// 已添加的额外类型
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// 是否没有任何实例和类型
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty() && self.types.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<Bean>, Vec<TypeDescriptor>) {
        (self.beans, self.types)
    }
}
