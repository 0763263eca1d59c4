//! 生命周期管理
//!
//! 为注册描述绑定激活函数：
//!
//! - 共享策略：按具体类型缓存，首个调用者创建，其余调用者等待并得到同一实例
//! - 按请求策略：每次解析都创建新实例
//! - 预构建实例和容器自身：总是返回同一对象
//!
//! 别名注册与具体类型注册共用同一个缓存单元，再转换为请求的父类型。
//! 后补的别名委托给具体类型自身的注册，预构建实例因此也能按父类型解析。

use crate::descriptor::{Activation, Descriptor, Source};
use crate::instantiation::instantiate;
use crate::manager::DependencyManagerImpl;
use dashmap::DashMap;
use di_abstractions::ResolveContext;
use infrastructure_common::{
    CreationStrategy, DependencyError, Instance, SupertypeDescriptor, TypeInfo,
};
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

fn activation(
    f: impl Fn(&DependencyManagerImpl, &mut ResolveContext) -> Result<Option<Instance>, DependencyError>
        + Send
        + Sync
        + 'static,
) -> Activation {
    Arc::new(f)
}

/// 为注册描述生成激活函数
pub(crate) fn bind(descriptor: &Descriptor) -> Activation {
    debug!(
        "绑定激活函数: {} [{}] ({})",
        descriptor.requested().name,
        descriptor.qualifier(),
        descriptor.strategy()
    );

    match descriptor.source() {
        Source::Container { as_trait } => {
            let as_trait = *as_trait;
            activation(move |manager, _ctx| Ok(Some(manager.self_instance(as_trait))))
        }
        Source::Instance(instance) => {
            let instance = instance.clone();
            activation(move |_manager, _ctx| Ok(Some(instance.clone())))
        }
        Source::Alias(target) => {
            let target = Arc::clone(target);
            let upcast = descriptor.upcast().cloned();
            activation(move |manager, ctx| {
                let instance = target.activate(manager, ctx)?;
                apply_upcast(instance, upcast.as_ref(), target.concrete())
            })
        }
        Source::Type(ty) => {
            let ty = Arc::clone(ty);
            let upcast = descriptor.upcast().cloned();
            match descriptor.strategy() {
                CreationStrategy::Shared => activation(move |manager, ctx| {
                    let instance = manager.singletons().get_or_create(ty.info(), ctx, |ctx| {
                        instantiate(manager, &ty, ctx)
                    })?;
                    apply_upcast(instance, upcast.as_ref(), ty.info())
                }),
                CreationStrategy::PerRequest => activation(move |manager, ctx| {
                    let instance = instantiate(manager, &ty, ctx)?;
                    apply_upcast(instance, upcast.as_ref(), ty.info())
                }),
            }
        }
    }
}

fn apply_upcast(
    instance: Option<Instance>,
    upcast: Option<&SupertypeDescriptor>,
    concrete: TypeInfo,
) -> Result<Option<Instance>, DependencyError> {
    match (instance, upcast) {
        (Some(instance), Some(supertype)) => supertype
            .upcast(&instance)
            .map(Some)
            .ok_or_else(|| DependencyError::type_mismatch(supertype.info.name, concrete.name)),
        (instance, _) => Ok(instance),
    }
}

enum InitFailure {
    Absent,
    Failed(DependencyError),
}

/// 共享实例缓存，按具体类型保存
#[derive(Default)]
pub(crate) struct SingletonCache {
    cells: DashMap<TypeId, Arc<OnceCell<Instance>>>,
}

impl SingletonCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn cell(&self, id: TypeId) -> Arc<OnceCell<Instance>> {
        if let Some(cell) = self.cells.get(&id) {
            return Arc::clone(cell.value());
        }
        Arc::clone(self.cells.entry(id).or_default().value())
    }

    /// 获取或创建共享实例
    ///
    /// 创建结果为空时不缓存，下一次解析会重新尝试。
    pub(crate) fn get_or_create(
        &self,
        concrete: TypeInfo,
        ctx: &mut ResolveContext,
        create: impl FnOnce(&mut ResolveContext) -> Result<Option<Instance>, DependencyError>,
    ) -> Result<Option<Instance>, DependencyError> {
        let cell = self.cell(concrete.id);
        if let Some(instance) = cell.get() {
            return Ok(Some(instance.clone()));
        }

        // 同一调用栈上重入初始化中的单元会阻塞，先检查循环
        ctx.ensure_not_resolving(&concrete)?;

        let outcome = cell.get_or_try_init(|| match create(ctx) {
            Ok(Some(instance)) => {
                debug!("缓存共享实例: {}", concrete.name);
                Ok(instance)
            }
            Ok(None) => Err(InitFailure::Absent),
            Err(e) => Err(InitFailure::Failed(e)),
        });

        match outcome {
            Ok(instance) => Ok(Some(instance.clone())),
            Err(InitFailure::Absent) => Ok(None),
            Err(InitFailure::Failed(e)) => Err(e),
        }
    }

    /// 已缓存的共享实例数量
    pub(crate) fn len(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.value().get().is_some())
            .count()
    }
}
