//! 类型发现服务实现

use di_abstractions::{DiscoveryCriteria, TypeDiscovery};
use infrastructure_common::{linked_types, Injectable, TypeDescriptor};
use tracing::debug;

/// 静态类型目录
///
/// 由调用方显式列出候选类型，保持登记顺序。
#[derive(Debug, Clone, Default)]
pub struct StaticTypeCatalog {
    types: Vec<TypeDescriptor>,
}

impl StaticTypeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入可注入类型
    pub fn with_type<T: Injectable>(self) -> Self {
        self.with_descriptor(T::type_descriptor())
    }

    /// 加入类型描述符
    pub fn with_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// 目录中的类型数量
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// 目录是否为空
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeDescriptor> for StaticTypeCatalog {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

impl TypeDiscovery for StaticTypeCatalog {
    fn name(&self) -> &str {
        "static"
    }

    fn find_matching(&self, criteria: &DiscoveryCriteria) -> Vec<TypeDescriptor> {
        criteria.apply(self.types.iter().cloned())
    }
}

/// 链接期类型目录
///
/// 读取 `#[derive(Injectable)]` 在程序启动时登记的类型。启动时登记顺序不固定，
/// 结果按类型全名排序。
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedTypeCatalog;

impl LinkedTypeCatalog {
    /// 创建链接期类型目录
    pub fn new() -> Self {
        Self
    }
}

impl TypeDiscovery for LinkedTypeCatalog {
    fn name(&self) -> &str {
        "linked"
    }

    fn find_matching(&self, criteria: &DiscoveryCriteria) -> Vec<TypeDescriptor> {
        let mut descriptors: Vec<TypeDescriptor> =
            linked_types().into_iter().map(|describe| describe()).collect();
        descriptors.sort_by(|a, b| a.name().cmp(b.name()));

        let found = criteria.apply(descriptors);
        debug!("链接期目录匹配 {} 个类型", found.len());
        found
    }
}
