//! 实例化引擎
//!
//! 选择参数最少的构造函数，通过解析引擎解析参数，构造实例后进行字段注入。
//! 缺失的依赖和构造失败按容器配置的失败策略处理。

use crate::manager::DependencyManagerImpl;
use di_abstractions::{FailurePolicy, ResolveContext};
use infrastructure_common::{
    normalize_qualifier, Arguments, DependencyError, DependencySpec, Instance, TypeDescriptor,
    TypeInfo,
};
use tracing::{debug, warn};

/// 创建类型实例，类型在构造期间位于解析链上
pub(crate) fn instantiate(
    manager: &DependencyManagerImpl,
    ty: &TypeDescriptor,
    ctx: &mut ResolveContext,
) -> Result<Option<Instance>, DependencyError> {
    ctx.push_type(ty.info())?;
    let result = construct(manager, ty, ctx);
    ctx.pop_type();
    result
}

fn construct(
    manager: &DependencyManagerImpl,
    ty: &TypeDescriptor,
    ctx: &mut ResolveContext,
) -> Result<Option<Instance>, DependencyError> {
    let constructor = ty
        .select_constructor()
        .ok_or_else(|| DependencyError::NotInstantiable {
            type_name: ty.name().to_string(),
        })?;

    let mut values = Vec::with_capacity(constructor.arity());
    for param in &constructor.params {
        values.push(resolve_dependency(manager, ty.info(), param, ctx)?);
    }

    let mut value = match constructor.build(&Arguments::new(values)) {
        Ok(value) => value,
        Err(source) => {
            return on_construction_error(
                manager.config().construction_error,
                DependencyError::creation_failed(ty.name(), source),
            );
        }
    };

    if ty.requires_field_injection() {
        for field in ty.fields() {
            let dependency = resolve_dependency(manager, ty.info(), &field.dependency, ctx)?;
            field.assign(&mut *value, dependency.as_ref());
        }
    }

    debug!("实例创建完成: {}", ty.name());
    ty.seal(value).map(Some)
}

/// 解析单个依赖，未解析到时按缺失策略处理
fn resolve_dependency(
    manager: &DependencyManagerImpl,
    owner: TypeInfo,
    spec: &DependencySpec,
    ctx: &mut ResolveContext,
) -> Result<Option<Instance>, DependencyError> {
    let resolution = manager.resolve_in(&spec.type_info, spec.qualifier.as_deref(), ctx)?;
    if let Some(instance) = resolution.into_instance() {
        return Ok(Some(instance));
    }

    let qualifier = normalize_qualifier(spec.qualifier.as_deref());
    match manager.config().missing_dependency {
        FailurePolicy::Silent => Ok(None),
        FailurePolicy::Warn => {
            warn!(
                "依赖缺失，注入空值: {} 需要 {} [{}]",
                owner.short_name(),
                spec.type_info.name,
                qualifier
            );
            Ok(None)
        }
        FailurePolicy::Fail => Err(DependencyError::MissingDependency {
            owner: owner.name.to_string(),
            dependency: spec.type_info.name.to_string(),
            qualifier: qualifier.to_string(),
        }),
    }
}

fn on_construction_error(
    policy: FailurePolicy,
    error: DependencyError,
) -> Result<Option<Instance>, DependencyError> {
    match policy {
        FailurePolicy::Silent => {
            debug!("构造失败，返回空实例: {}", error);
            Ok(None)
        }
        FailurePolicy::Warn => {
            warn!("构造失败，返回空实例: {}", error);
            Ok(None)
        }
        FailurePolicy::Fail => Err(error),
    }
}
