//! 应用启动器
//!
//! 启动流程是一个单向状态机：
//!
//! ```text
//! Idle -> ClassesDiscovered -> EntryFound -> EngineInitialized -> EntryResolved -> Executed
//! ```
//!
//! 找不到入口类型或入口方法、入口实例无法创建、入口方法执行失败都是致命错误，
//! 以 [`ApplicationInitializeError`] 返回。

use crate::beans::BeansBuilder;
use crate::errors::{ApplicationInitializeError, InitializeResult};
use di_abstractions::{
    ContainerConfig, DependencyManager, DependencyManagerExt, DiscoveryCriteria, MarkerFilter,
    TypeDiscovery,
};
use di_impl::DependencyManagerImpl;
use infrastructure_common::{
    Arguments, DependencyError, Instance, MethodDescriptor, TypeDescriptor,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 启动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunnerState {
    /// 尚未开始
    Idle,
    /// 已完成类型发现
    ClassesDiscovered,
    /// 已找到入口类型和入口方法
    EntryFound,
    /// 依赖管理器已初始化
    EngineInitialized,
    /// 入口实例已创建
    EntryResolved,
    /// 入口方法执行完成
    Executed,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ClassesDiscovered => "classes_discovered",
            Self::EntryFound => "entry_found",
            Self::EngineInitialized => "engine_initialized",
            Self::EntryResolved => "entry_resolved",
            Self::Executed => "executed",
        };
        f.write_str(name)
    }
}

/// 应用启动器
pub struct ApplicationRunner {
    discovery: Arc<dyn TypeDiscovery>,
    scope: Option<String>,
    config: ContainerConfig,
    beans: BeansBuilder,
    state: RunnerState,
}

impl ApplicationRunner {
    pub(crate) fn new(
        discovery: Arc<dyn TypeDiscovery>,
        scope: Option<String>,
        config: ContainerConfig,
        beans: BeansBuilder,
    ) -> Self {
        Self {
            discovery,
            scope,
            config,
            beans,
            state: RunnerState::Idle,
        }
    }

    /// 当前启动状态
    pub fn state(&self) -> RunnerState {
        self.state
    }

    fn advance(&mut self, next: RunnerState) {
        debug!("启动状态: {} -> {}", self.state, next);
        self.state = next;
    }

    /// 执行启动流程，成功时返回已初始化的依赖管理器
    pub fn run(&mut self) -> InitializeResult<DependencyManagerImpl> {
        let scope = self.scope.clone().unwrap_or_else(|| "*".to_string());
        info!("开始启动应用, 类型发现: {}, 范围: {}", self.discovery.name(), scope);

        let candidates = self.discover();
        self.advance(RunnerState::ClassesDiscovered);

        let (entry, method) = select_entry(&candidates, &scope)?;
        info!("启动入口: {}::{}", entry.name(), method.name);
        self.advance(RunnerState::EntryFound);

        let manager = self.initialize_engine(&candidates, &entry);
        self.advance(RunnerState::EngineInitialized);

        let target = resolve_entry(&manager, &entry)?;
        self.advance(RunnerState::EntryResolved);

        let args = Arguments::new(
            method
                .params
                .iter()
                .map(|param| {
                    manager
                        .resolve(&param.type_info, param.qualifier.as_deref())
                        .into_instance()
                })
                .collect(),
        );
        method
            .invoke(&target, &args)
            .map_err(|source| ApplicationInitializeError::InvocationFailed {
                method_name: method.name.to_string(),
                source,
            })?;
        self.advance(RunnerState::Executed);

        info!("应用启动完成");
        Ok(manager)
    }

    fn discover(&self) -> Vec<TypeDescriptor> {
        let candidates = match &self.scope {
            Some(scope) => self.discovery.find_in(scope),
            None => self.discovery.find(),
        };
        info!("发现 {} 个候选类型", candidates.len());
        candidates
    }

    fn initialize_engine(
        &mut self,
        candidates: &[TypeDescriptor],
        entry: &TypeDescriptor,
    ) -> DependencyManagerImpl {
        let manager = DependencyManagerImpl::builder()
            .with_config(self.config.clone())
            .with_candidates(candidates.iter().cloned())
            .build();

        manager.add_dependency_arc::<dyn TypeDiscovery>(Arc::clone(&self.discovery));

        let (beans, extra_types) = std::mem::take(&mut self.beans).into_parts();
        for bean in beans {
            manager.add_instance(bean);
        }

        let setup_criteria = DiscoveryCriteria::new().with_marker(MarkerFilter::Setup);
        for setup in candidates.iter().filter(|ty| setup_criteria.matches(ty)) {
            run_setup(&manager, setup);
        }

        let mut extra = Vec::with_capacity(extra_types.len() + 1);
        extra.push(entry.clone());
        extra.extend(extra_types);
        manager.initialize_with(extra);
        manager
    }
}

impl fmt::Debug for ApplicationRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationRunner")
            .field("discovery", &self.discovery.name())
            .field("scope", &self.scope)
            .field("state", &self.state)
            .finish()
    }
}

/// 选择入口类型和入口方法
fn select_entry(
    candidates: &[TypeDescriptor],
    scope: &str,
) -> InitializeResult<(TypeDescriptor, MethodDescriptor)> {
    let mut entries = candidates.iter().filter(|ty| ty.entry_point().is_some());
    let entry = entries
        .next()
        .ok_or_else(|| ApplicationInitializeError::EntryTypeNotFound {
            scope: scope.to_string(),
        })?;
    for ignored in entries {
        warn!("存在多个启动入口, 忽略: {}", ignored.name());
    }

    let method_name = entry
        .entry_point()
        .map(|marker| marker.method_name.as_str())
        .unwrap_or_default();
    let method = entry.find_method(method_name).cloned().ok_or_else(|| {
        ApplicationInitializeError::EntryMethodNotFound {
            type_name: entry.name().to_string(),
            method_name: method_name.to_string(),
        }
    })?;

    Ok((entry.clone(), method))
}

/// 创建配置类实例，把工厂方法的产物注册为依赖，失败时记录并跳过
fn run_setup(manager: &DependencyManagerImpl, setup: &TypeDescriptor) {
    let instance = match manager.create(setup) {
        Ok(Some(instance)) => instance,
        Ok(None) => {
            warn!("配置类实例未创建, 跳过: {}", setup.name());
            return;
        }
        Err(e) => {
            warn!("配置类创建失败, 跳过: {}, 原因: {}", setup.name(), e);
            return;
        }
    };

    for factory in setup.factories() {
        match factory.produce(&instance) {
            Ok(Some(bean)) => {
                debug!("工厂方法 {}::{} 产生实例", setup.name(), factory.name);
                manager.add_instance(bean);
            }
            Ok(None) => debug!("工厂方法 {}::{} 未产生实例", setup.name(), factory.name),
            Err(e) => warn!(
                "工厂方法执行失败, 跳过: {}::{}, 原因: {}",
                setup.name(),
                factory.name,
                e
            ),
        }
    }
}

fn resolve_entry(
    manager: &DependencyManagerImpl,
    entry: &TypeDescriptor,
) -> InitializeResult<Instance> {
    let not_created = |source: Option<DependencyError>| ApplicationInitializeError::EntryNotCreated {
        type_name: entry.name().to_string(),
        source,
    };

    let resolution = manager
        .try_resolve(&entry.info(), None)
        .map_err(|e| not_created(Some(e)))?;
    resolution.into_instance().ok_or_else(|| not_created(None))
}
