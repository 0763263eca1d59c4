//! 依赖管理器实现

use crate::descriptor::Descriptor;
use crate::instantiation::instantiate;
use crate::lifecycle::SingletonCache;
use crate::registry::Registry;
use di_abstractions::{
    ContainerConfig, DependencyManager, DiscoveryCriteria, MarkerFilter, RegistrationInfo,
    Resolution, ResolveContext, TypeDiscovery,
};
use infrastructure_common::{
    flatten_supertypes, normalize_qualifier, Bean, DependencyError, Instance, TypeDescriptor,
    TypeInfo,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

struct ManagerInner {
    config: ContainerConfig,
    registry: Registry,
    singletons: SingletonCache,
    candidates: Vec<TypeDescriptor>,
    discovery: Option<Arc<dyn TypeDiscovery>>,
    pending_types: Mutex<Vec<TypeDescriptor>>,
    initialized: AtomicBool,
}

/// 依赖管理器
///
/// 轻量句柄，克隆后共享同一个注册表和共享实例缓存。
///
/// ```rust,ignore
/// let manager = DependencyManagerImpl::builder()
///     .with_candidates(vec![Service1Impl::type_descriptor()])
///     .build();
/// manager.initialize();
/// let service = manager.get_instance::<dyn Service1>();
/// ```
#[derive(Clone)]
pub struct DependencyManagerImpl {
    inner: Arc<ManagerInner>,
}

impl DependencyManagerImpl {
    /// 使用默认配置创建
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// 使用指定配置创建
    pub fn with_config(config: ContainerConfig) -> Self {
        Self::builder().with_config(config).build()
    }

    /// 创建构建器
    pub fn builder() -> DependencyManagerBuilder {
        DependencyManagerBuilder::default()
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// 查找注册描述（不触发实例化）
    pub fn descriptor(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> Option<Arc<Descriptor>> {
        self.inner.registry.lookup(type_info.id, qualifier)
    }

    /// 注册描述总数
    pub fn registration_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// 已缓存的共享实例数量
    pub fn singleton_count(&self) -> usize {
        self.inner.singletons.len()
    }

    pub(crate) fn singletons(&self) -> &SingletonCache {
        &self.inner.singletons
    }

    pub(crate) fn self_instance(&self, as_trait: bool) -> Instance {
        if as_trait {
            let manager: Arc<dyn DependencyManager> = Arc::new(self.clone());
            Instance::new(manager)
        } else {
            Instance::from_value(self.clone())
        }
    }

    /// 在给定解析上下文中解析依赖
    pub(crate) fn resolve_in(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
        ctx: &mut ResolveContext,
    ) -> Result<Resolution, DependencyError> {
        match self.activate_in(type_info, qualifier, ctx) {
            Some((descriptor, outcome)) => Ok(Resolution::hit(outcome?, descriptor.concrete())),
            None => Ok(Resolution::miss(*type_info)),
        }
    }

    fn register_self(&self) {
        let targets = [
            (TypeInfo::of::<Self>(), false),
            (TypeInfo::of::<dyn DependencyManager>(), true),
        ];
        for (requested, as_trait) in targets {
            let descriptor = Arc::new(Descriptor::for_container(requested, as_trait));
            if self.inner.registry.declare(Arc::clone(&descriptor), None) {
                descriptor.bind();
            }
        }
        debug!("依赖管理器已注册自身");
    }

    /// 收集本批候选类型
    fn collect_candidates(&self, extra_types: Vec<TypeDescriptor>) -> Vec<TypeDescriptor> {
        let mut batch: Vec<TypeDescriptor> = self
            .inner
            .candidates
            .iter()
            .filter(|ty| ty.injectable().is_some())
            .cloned()
            .collect();

        // 未配置候选类型时才使用类型发现服务
        let discovery = self
            .inner
            .discovery
            .as_ref()
            .filter(|_| self.inner.candidates.is_empty());
        if let Some(discovery) = discovery {
            let criteria = DiscoveryCriteria::new().with_marker(MarkerFilter::Injectable);
            let found = discovery.find_matching(&criteria);
            debug!("类型发现 {} 找到 {} 个可注入类型", discovery.name(), found.len());
            batch.extend(found);
        }

        batch.extend(self.inner.pending_types.lock().drain(..));
        batch.extend(extra_types);
        batch
    }

    /// 加入依赖声明中可隐式注册且尚未注册的类型
    fn expand_implicit(&self, batch: Vec<TypeDescriptor>) -> Vec<TypeDescriptor> {
        let mut seen: HashSet<TypeInfo> = batch.iter().map(TypeDescriptor::info).collect();
        let mut queue: VecDeque<TypeDescriptor> = batch.into();
        let mut expanded = Vec::with_capacity(queue.len());

        while let Some(ty) = queue.pop_front() {
            for dependency in ty.dependencies() {
                let Some(provider) = dependency.provider else {
                    continue;
                };
                if !self.inner.registry.contains_type(dependency.type_info.id)
                    && seen.insert(dependency.type_info)
                {
                    debug!(
                        "隐式注册依赖类型: {} (来自 {})",
                        dependency.type_info.name,
                        ty.name()
                    );
                    queue.push_back(provider());
                }
            }
            expanded.push(ty);
        }
        expanded
    }

    /// 声明类型自身及其全部父类型的注册
    fn declare_type(&self, ty: Arc<TypeDescriptor>) -> Vec<Arc<Descriptor>> {
        let registry = &self.inner.registry;
        if registry.contains_type(ty.info().id) {
            debug!("类型已注册，只补充父类型别名: {}", ty.name());
            return self.declare_missing_aliases(&ty);
        }

        if !ty.is_instantiable() {
            debug!("跳过不可实例化的类型: {}", ty.name());
            return Vec::new();
        }

        let marker = ty.injectable().cloned().unwrap_or_default();
        let qualifier = marker.effective_qualifier().to_string();
        let mut declared = Vec::new();

        let own = Arc::new(Descriptor::for_type(
            Arc::clone(&ty),
            ty.info(),
            &qualifier,
            marker.strategy,
            None,
        ));
        if registry.declare(Arc::clone(&own), marker.qualifier.as_deref()) {
            declared.push(own);
        }

        for supertype in ty.all_supertypes() {
            let alias = Arc::new(Descriptor::for_type(
                Arc::clone(&ty),
                supertype.info,
                &qualifier,
                marker.strategy,
                Some(supertype),
            ));
            if registry.declare(Arc::clone(&alias), None) {
                declared.push(alias);
            }
        }

        declared
    }

    /// 为已注册的具体类型（例如预构建实例）补充描述符声明的父类型别名
    fn declare_missing_aliases(&self, ty: &TypeDescriptor) -> Vec<Arc<Descriptor>> {
        let registry = &self.inner.registry;
        let supertypes = ty.all_supertypes();
        let mut declared = Vec::new();
        for target in registry.descriptors_of(ty.info().id) {
            for supertype in &supertypes {
                let alias = Arc::new(Descriptor::for_alias(Arc::clone(&target), supertype.clone()));
                if registry.declare(Arc::clone(&alias), None) {
                    declared.push(alias);
                }
            }
        }
        declared
    }

    /// 查找并激活注册描述，未命中时返回 `None`
    fn activate_in(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
        ctx: &mut ResolveContext,
    ) -> Option<(Arc<Descriptor>, Result<Option<Instance>, DependencyError>)> {
        let Some(descriptor) = self.inner.registry.lookup(type_info.id, qualifier) else {
            debug!(
                "未找到注册: {} [{}]",
                type_info.name,
                normalize_qualifier(qualifier)
            );
            return None;
        };
        let outcome = descriptor.activate(self, ctx);
        Some((descriptor, outcome))
    }
}

impl Default for DependencyManagerImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DependencyManagerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyManagerImpl")
            .field("config", &self.inner.config)
            .field("registrations", &self.inner.registry.len())
            .field("singletons", &self.inner.singletons.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl DependencyManager for DependencyManagerImpl {
    fn initialize_with(&self, extra_types: Vec<TypeDescriptor>) -> usize {
        let mut batch = self.collect_candidates(extra_types);
        if self.inner.config.implicit_registration {
            batch = self.expand_implicit(batch);
        }
        info!("开始注册 {} 个候选类型", batch.len());

        // 先声明整批注册，再统一绑定激活函数
        let declared: Vec<Arc<Descriptor>> = batch
            .into_iter()
            .flat_map(|ty| self.declare_type(Arc::new(ty)))
            .collect();
        let bound = declared.iter().filter(|descriptor| descriptor.bind()).count();

        self.inner.initialized.store(true, Ordering::Release);
        info!(
            "依赖管理器初始化完成: 新增注册 {} 条, 绑定 {} 条",
            declared.len(),
            bound
        );
        declared.len()
    }

    fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    fn add_instance(&self, bean: Bean) {
        let qualifier = normalize_qualifier(bean.qualifier()).to_string();
        let instance = bean.instance().clone();
        let concrete = instance.type_info();
        if !bean.strategy().is_shared() {
            debug!("预构建实例总是返回同一对象，忽略按请求策略: {}", concrete.name);
        }

        let mut declared = vec![Arc::new(Descriptor::for_instance(
            instance.clone(),
            concrete,
            &qualifier,
            bean.strategy(),
        ))];
        for supertype in flatten_supertypes(bean.supertypes()) {
            match supertype.upcast(&instance) {
                Some(alias) => declared.push(Arc::new(Descriptor::for_instance(
                    alias,
                    concrete,
                    &qualifier,
                    bean.strategy(),
                ))),
                None => warn!(
                    "预构建实例无法转换为父类型: {} -> {}",
                    concrete.name, supertype.info.name
                ),
            }
        }

        let mut registered = 0;
        for descriptor in declared {
            if self.inner.registry.declare(Arc::clone(&descriptor), None) {
                descriptor.bind();
                registered += 1;
            }
        }
        info!(
            "注册预构建实例: {} [{}], 新增注册 {} 条",
            concrete.name, qualifier, registered
        );
    }

    fn add_type(&self, descriptor: TypeDescriptor) {
        debug!("记录待注册类型: {}", descriptor.name());
        self.inner.pending_types.lock().push(descriptor);
    }

    fn try_resolve(
        &self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> Result<Resolution, DependencyError> {
        let mut ctx = ResolveContext::new(self.inner.config.max_resolution_depth);
        self.resolve_in(type_info, qualifier, &mut ctx)
    }

    fn resolve(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> Resolution {
        let mut ctx = ResolveContext::new(self.inner.config.max_resolution_depth);
        match self.activate_in(type_info, qualifier, &mut ctx) {
            Some((descriptor, Ok(instance))) => Resolution::hit(instance, descriptor.concrete()),
            Some((descriptor, Err(e))) => {
                error!("依赖解析失败: {}, 原因: {}", type_info.name, e);
                Resolution::hit(None, descriptor.concrete())
            }
            None => Resolution::miss(*type_info),
        }
    }

    fn create(&self, descriptor: &TypeDescriptor) -> Result<Option<Instance>, DependencyError> {
        let mut ctx = ResolveContext::new(self.inner.config.max_resolution_depth);
        instantiate(self, descriptor, &mut ctx)
    }

    fn registered_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    fn registrations(&self) -> Vec<RegistrationInfo> {
        self.inner.registry.snapshot()
    }
}

/// 依赖管理器构建器
#[derive(Default)]
pub struct DependencyManagerBuilder {
    config: ContainerConfig,
    candidates: Vec<TypeDescriptor>,
    discovery: Option<Arc<dyn TypeDiscovery>>,
}

impl DependencyManagerBuilder {
    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置候选类型（只有带可注入标记的类型会被注册）
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    /// 添加单个候选类型
    pub fn add_candidate(mut self, candidate: TypeDescriptor) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// 设置类型发现服务，未配置候选类型时初始化从中查找可注入类型
    pub fn with_discovery(mut self, discovery: Arc<dyn TypeDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// 构建依赖管理器
    pub fn build(self) -> DependencyManagerImpl {
        let register_self = self.config.register_self;
        let manager = DependencyManagerImpl {
            inner: Arc::new(ManagerInner {
                config: self.config,
                registry: Registry::new(),
                singletons: SingletonCache::new(),
                candidates: self.candidates,
                discovery: self.discovery,
                pending_types: Mutex::new(Vec::new()),
                initialized: AtomicBool::new(false),
            }),
        };
        if register_self {
            manager.register_self();
        }
        manager
    }
}
