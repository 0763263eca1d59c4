//! 注册描述

use crate::lifecycle;
use crate::manager::DependencyManagerImpl;
use di_abstractions::{RegistrationInfo, RegistrationSource, ResolveContext};
use infrastructure_common::{
    CreationStrategy, DependencyError, Instance, SupertypeDescriptor, TypeDescriptor, TypeInfo,
};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 激活函数，每次解析命中时调用
pub(crate) type Activation = Arc<
    dyn Fn(&DependencyManagerImpl, &mut ResolveContext) -> Result<Option<Instance>, DependencyError>
        + Send
        + Sync,
>;

/// 实例来源
#[derive(Clone)]
pub(crate) enum Source {
    /// 由类型描述符构造
    Type(Arc<TypeDescriptor>),
    /// 预构建实例（已转换为请求类型）
    Instance(Instance),
    /// 容器自身
    Container { as_trait: bool },
    /// 父类型别名，委托给具体类型自身的注册
    Alias(Arc<Descriptor>),
}

/// 注册描述
///
/// 每个（请求类型，限定符）对应一个，声明后不再修改。激活函数在整批声明完成后
/// 绑定且只绑定一次。
pub struct Descriptor {
    requested: TypeInfo,
    qualifier: String,
    strategy: CreationStrategy,
    concrete: TypeInfo,
    requires_field_injection: bool,
    source: Source,
    upcast: Option<SupertypeDescriptor>,
    activation: OnceCell<Activation>,
}

impl Descriptor {
    pub(crate) fn for_type(
        ty: Arc<TypeDescriptor>,
        requested: TypeInfo,
        qualifier: &str,
        strategy: CreationStrategy,
        upcast: Option<SupertypeDescriptor>,
    ) -> Self {
        Self {
            requested,
            qualifier: qualifier.to_string(),
            strategy,
            concrete: ty.info(),
            requires_field_injection: ty.requires_field_injection(),
            source: Source::Type(ty),
            upcast,
            activation: OnceCell::new(),
        }
    }

    pub(crate) fn for_instance(
        instance: Instance,
        concrete: TypeInfo,
        qualifier: &str,
        strategy: CreationStrategy,
    ) -> Self {
        Self {
            requested: instance.type_info(),
            qualifier: qualifier.to_string(),
            strategy,
            concrete,
            requires_field_injection: false,
            source: Source::Instance(instance),
            upcast: None,
            activation: OnceCell::new(),
        }
    }

    pub(crate) fn for_container(requested: TypeInfo, as_trait: bool) -> Self {
        Self {
            requested,
            qualifier: infrastructure_common::DEFAULT_QUALIFIER.to_string(),
            strategy: CreationStrategy::Shared,
            concrete: TypeInfo::of::<DependencyManagerImpl>(),
            requires_field_injection: false,
            source: Source::Container { as_trait },
            upcast: None,
            activation: OnceCell::new(),
        }
    }

    /// 为已有的具体类型注册补充父类型别名，限定符和策略沿用原注册
    pub(crate) fn for_alias(target: Arc<Descriptor>, supertype: SupertypeDescriptor) -> Self {
        Self {
            requested: supertype.info,
            qualifier: target.qualifier.clone(),
            strategy: target.strategy,
            concrete: target.concrete,
            requires_field_injection: target.requires_field_injection,
            upcast: Some(supertype),
            source: Source::Alias(target),
            activation: OnceCell::new(),
        }
    }

    /// 请求类型
    pub fn requested(&self) -> TypeInfo {
        self.requested
    }

    /// 限定符
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// 创建策略
    pub fn strategy(&self) -> CreationStrategy {
        self.strategy
    }

    /// 具体类型
    pub fn concrete(&self) -> TypeInfo {
        self.concrete
    }

    /// 是否需要字段注入
    pub fn requires_field_injection(&self) -> bool {
        self.requires_field_injection
    }

    /// 激活函数是否已绑定
    pub fn is_bound(&self) -> bool {
        self.activation.get().is_some()
    }

    pub(crate) fn source(&self) -> &Source {
        &self.source
    }

    pub(crate) fn upcast(&self) -> Option<&SupertypeDescriptor> {
        self.upcast.as_ref()
    }

    /// 绑定激活函数，返回本次调用是否完成了绑定
    pub(crate) fn bind(&self) -> bool {
        let mut bound = false;
        self.activation.get_or_init(|| {
            bound = true;
            lifecycle::bind(self)
        });
        bound
    }

    /// 调用激活函数，尚未绑定时先绑定
    pub(crate) fn activate(
        &self,
        manager: &DependencyManagerImpl,
        ctx: &mut ResolveContext,
    ) -> Result<Option<Instance>, DependencyError> {
        let activation = self.activation.get_or_init(|| lifecycle::bind(self));
        activation(manager, ctx)
    }

    /// 注册信息快照
    pub fn registration_info(&self) -> RegistrationInfo {
        RegistrationInfo {
            requested: self.requested,
            qualifier: self.qualifier.clone(),
            concrete: self.concrete,
            strategy: self.strategy,
            requires_field_injection: self.requires_field_injection,
            source: self.registration_source(),
        }
    }

    fn registration_source(&self) -> RegistrationSource {
        match &self.source {
            Source::Type(_) => RegistrationSource::Type,
            Source::Instance(_) => RegistrationSource::Instance,
            Source::Container { .. } => RegistrationSource::Container,
            Source::Alias(target) => target.registration_source(),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("requested", &self.requested.name)
            .field("qualifier", &self.qualifier)
            .field("strategy", &self.strategy)
            .field("concrete", &self.concrete.name)
            .field("requires_field_injection", &self.requires_field_injection)
            .field("bound", &self.is_bound())
            .finish()
    }
}
