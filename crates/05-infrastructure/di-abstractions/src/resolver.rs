//! 依赖解析结果和解析上下文

use infrastructure_common::{DependencyError, Instance, TypeInfo};
use std::sync::Arc;

/// 解析结果
///
/// `found` 表示是否存在对应的注册，与实例是否成功创建无关。
#[derive(Debug, Clone)]
pub struct Resolution {
    found: bool,
    instance: Option<Instance>,
    resolved_type: TypeInfo,
}

impl Resolution {
    /// 命中注册
    pub fn hit(instance: Option<Instance>, resolved_type: TypeInfo) -> Self {
        Self {
            found: true,
            instance,
            resolved_type,
        }
    }

    /// 未命中注册
    pub fn miss(requested: TypeInfo) -> Self {
        Self {
            found: false,
            instance: None,
            resolved_type: requested,
        }
    }

    /// 是否存在对应的注册
    pub fn found(&self) -> bool {
        self.found
    }

    /// 获取指定类型的实例
    pub fn value<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.as_ref().and_then(Instance::downcast::<T>)
    }

    /// 类型擦除的实例
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// 取出类型擦除的实例
    pub fn into_instance(self) -> Option<Instance> {
        self.instance
    }

    /// 命中时为注册的具体类型，否则为请求的类型
    pub fn resolved_type(&self) -> TypeInfo {
        self.resolved_type
    }
}

/// 默认最大解析深度
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// 解析上下文
///
/// 每次顶层解析创建一个，记录当前调用栈上正在构造的类型。
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<TypeInfo>,
    /// 最大递归深度
    max_depth: usize,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(max_depth: usize) -> Self {
        Self {
            resolution_chain: Vec::new(),
            max_depth,
        }
    }

    /// 检查类型是否已在解析链上
    pub fn ensure_not_resolving(&self, type_info: &TypeInfo) -> Result<(), DependencyError> {
        if self.resolution_chain.contains(type_info) {
            let chain = self
                .resolution_chain
                .iter()
                .chain(std::iter::once(type_info))
                .map(TypeInfo::short_name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DependencyError::CircularDependency {
                dependency_chain: chain,
            });
        }
        Ok(())
    }

    /// 添加类型到解析链
    pub fn push_type(&mut self, type_info: TypeInfo) -> Result<(), DependencyError> {
        self.ensure_not_resolving(&type_info)?;
        if self.resolution_chain.len() >= self.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                type_name: type_info.name.to_string(),
                max_depth: self.max_depth,
            });
        }
        self.resolution_chain.push(type_info);
        Ok(())
    }

    /// 从解析链中移除类型
    pub fn pop_type(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 当前解析链
    pub fn chain(&self) -> &[TypeInfo] {
        &self.resolution_chain
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESOLUTION_DEPTH)
    }
}
