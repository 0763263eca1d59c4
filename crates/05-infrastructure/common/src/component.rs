//! 类型描述符
//!
//! 容器不依赖运行时反射，每个可被管理的类型都提供一个 [`TypeDescriptor`]，
//! 在注册时一次性描述：
//!
//! - 标记（可注入、启动入口、配置类）
//! - 构造函数及其参数依赖
//! - 需要注入的字段
//! - 可作为别名注册的父类型（trait 对象）
//! - 可调用的方法和工厂方法
//!
//! 描述符可以通过 [`TypeDescriptor::builder`] 手工编写，也可以由
//! `#[derive(Injectable)]` 生成。

use crate::errors::{DependencyError, DynError};
use crate::instance::{Arguments, Bean, Instance, IntoBean, IntoInvocationResult};
use crate::lifecycle::CreationStrategy;
use crate::metadata::{normalize_qualifier, TypeInfo};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 可注入组件 trait
///
/// 提供类型描述符，容器据此构造、注入和注册组件。
pub trait Injectable: Send + Sync + 'static {
    /// 获取类型描述符
    fn type_descriptor() -> TypeDescriptor
    where
        Self: Sized;
}

/// 默认启动方法名称
pub const DEFAULT_ENTRY_METHOD: &str = "initialize";

/// 可注入标记
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectableMarker {
    /// 创建策略
    pub strategy: CreationStrategy,
    /// 限定符
    pub qualifier: Option<String>,
}

impl InjectableMarker {
    /// 创建指定策略的标记
    pub fn new(strategy: CreationStrategy) -> Self {
        Self {
            strategy,
            qualifier: None,
        }
    }

    /// 共享策略标记
    pub fn shared() -> Self {
        Self::new(CreationStrategy::Shared)
    }

    /// 按请求策略标记
    pub fn per_request() -> Self {
        Self::new(CreationStrategy::PerRequest)
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 规范化后的限定符
    pub fn effective_qualifier(&self) -> &str {
        normalize_qualifier(self.qualifier.as_deref())
    }
}

/// 启动入口标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointMarker {
    /// 启动方法名称
    pub method_name: String,
}

impl Default for EntryPointMarker {
    fn default() -> Self {
        Self {
            method_name: DEFAULT_ENTRY_METHOD.to_string(),
        }
    }
}

/// 依赖声明
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// 依赖的类型
    pub type_info: TypeInfo,
    /// 限定符
    pub qualifier: Option<String>,
    /// 隐式注册时使用的描述符
    pub provider: Option<fn() -> TypeDescriptor>,
}

impl DependencySpec {
    /// 声明对指定类型的依赖
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
            provider: None,
        }
    }

    /// 声明依赖，并在未注册时由容器隐式注册该类型
    pub fn auto<T: Injectable>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
            provider: Some(T::type_descriptor as fn() -> TypeDescriptor),
        }
    }

    /// 设置限定符
    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

type BuildFn = dyn Fn(&Arguments) -> Result<Box<dyn Any + Send + Sync>, DynError> + Send + Sync;
type AssignFn = dyn Fn(&mut (dyn Any + Send + Sync), Option<&Instance>) + Send + Sync;
type UpcastFn = dyn Fn(&Instance) -> Option<Instance> + Send + Sync;
type InvokeFn = dyn Fn(&Instance, &Arguments) -> Result<(), DynError> + Send + Sync;
type ProduceFn = dyn Fn(&Instance) -> Result<Option<Bean>, DynError> + Send + Sync;
type SealFn = fn(Box<dyn Any + Send + Sync>) -> Option<Instance>;

/// 构造函数描述
#[derive(Clone)]
pub struct ConstructorDescriptor {
    /// 参数依赖
    pub params: Vec<DependencySpec>,
    build: Arc<BuildFn>,
}

impl ConstructorDescriptor {
    /// 参数个数
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// 使用已解析的参数构造未封装的值
    pub fn build(&self, args: &Arguments) -> Result<Box<dyn Any + Send + Sync>, DynError> {
        (self.build)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// 注入字段描述
#[derive(Clone)]
pub struct FieldDescriptor {
    /// 字段名称
    pub name: &'static str,
    /// 字段依赖
    pub dependency: DependencySpec,
    assign: Arc<AssignFn>,
}

impl FieldDescriptor {
    /// 为目标对象赋值，`None` 表示未解析到依赖
    pub fn assign(&self, target: &mut (dyn Any + Send + Sync), value: Option<&Instance>) {
        (self.assign)(target, value);
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("dependency", &self.dependency)
            .finish_non_exhaustive()
    }
}

/// 父类型描述
///
/// 描述一个可作为别名的 trait 对象，以及从具体实例到该 trait 对象的转换。
/// `parents` 是该父类型自身继承的父类型。
#[derive(Clone)]
pub struct SupertypeDescriptor {
    /// 父类型信息
    pub info: TypeInfo,
    /// 继承的父类型
    pub parents: Vec<SupertypeDescriptor>,
    upcast: Arc<UpcastFn>,
}

impl SupertypeDescriptor {
    /// 创建从 `C` 到 `S` 的父类型描述
    pub fn new<C, S>(upcast: fn(Arc<C>) -> Arc<S>) -> Self
    where
        C: Send + Sync + 'static,
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            info: TypeInfo::of::<S>(),
            parents: Vec::new(),
            upcast: Arc::new(move |instance: &Instance| {
                instance
                    .downcast::<C>()
                    .map(|concrete| Instance::new(upcast(concrete)))
            }),
        }
    }

    /// 添加继承的父类型
    pub fn with_parent(mut self, parent: Self) -> Self {
        self.parents.push(parent);
        self
    }

    /// 将具体实例转换为父类型实例
    pub fn upcast(&self, instance: &Instance) -> Option<Instance> {
        (self.upcast)(instance)
    }

    fn flatten_into(&self, seen: &mut HashSet<TypeInfo>, out: &mut Vec<Self>) {
        if seen.insert(self.info) {
            out.push(self.clone());
        }
        for parent in &self.parents {
            parent.flatten_into(seen, out);
        }
    }
}

impl fmt::Debug for SupertypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupertypeDescriptor")
            .field("info", &self.info.name)
            .field("parents", &self.parents)
            .finish_non_exhaustive()
    }
}

/// 深度优先展开父类型树，子类型在前，重复的类型只保留第一次出现
pub fn flatten_supertypes(supertypes: &[SupertypeDescriptor]) -> Vec<SupertypeDescriptor> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for supertype in supertypes {
        supertype.flatten_into(&mut seen, &mut out);
    }
    out
}

/// 方法描述
#[derive(Clone)]
pub struct MethodDescriptor {
    /// 方法名称
    pub name: &'static str,
    /// 参数依赖
    pub params: Vec<DependencySpec>,
    invoke: Arc<InvokeFn>,
}

impl MethodDescriptor {
    /// 参数个数
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// 在目标实例上调用方法
    pub fn invoke(&self, target: &Instance, args: &Arguments) -> Result<(), DynError> {
        (self.invoke)(target, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// 工厂方法描述
#[derive(Clone)]
pub struct FactoryMethod {
    /// 方法名称
    pub name: &'static str,
    produce: Arc<ProduceFn>,
}

impl FactoryMethod {
    /// 在配置类实例上调用工厂方法
    pub fn produce(&self, target: &Instance) -> Result<Option<Bean>, DynError> {
        (self.produce)(target)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// 类型描述符
#[derive(Clone)]
pub struct TypeDescriptor {
    info: TypeInfo,
    injectable: Option<InjectableMarker>,
    entry_point: Option<EntryPointMarker>,
    setup: bool,
    constructors: Vec<ConstructorDescriptor>,
    fields: Vec<FieldDescriptor>,
    supertypes: Vec<SupertypeDescriptor>,
    methods: Vec<MethodDescriptor>,
    factories: Vec<FactoryMethod>,
    seal: SealFn,
}

impl TypeDescriptor {
    /// 创建类型描述符构建器
    pub fn builder<C: Send + Sync + 'static>() -> TypeDescriptorBuilder<C> {
        TypeDescriptorBuilder::new()
    }

    /// 类型信息
    pub fn info(&self) -> TypeInfo {
        self.info
    }

    /// 类型名称
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// 类型所在模块路径
    pub fn module_path(&self) -> &'static str {
        self.info.module_path()
    }

    /// 可注入标记
    pub fn injectable(&self) -> Option<&InjectableMarker> {
        self.injectable.as_ref()
    }

    /// 启动入口标记
    pub fn entry_point(&self) -> Option<&EntryPointMarker> {
        self.entry_point.as_ref()
    }

    /// 是否为配置类
    pub fn is_setup(&self) -> bool {
        self.setup
    }

    /// 构造函数列表（声明顺序）
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// 是否可实例化
    pub fn is_instantiable(&self) -> bool {
        !self.constructors.is_empty()
    }

    /// 选择参数最少的构造函数，参数个数相同时取先声明者
    pub fn select_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors
            .iter()
            .min_by_key(|constructor| constructor.arity())
    }

    /// 注入字段
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// 是否需要字段注入
    pub fn requires_field_injection(&self) -> bool {
        !self.fields.is_empty()
    }

    /// 直接声明的父类型
    pub fn supertypes(&self) -> &[SupertypeDescriptor] {
        &self.supertypes
    }

    /// 展开后的全部父类型
    pub fn all_supertypes(&self) -> Vec<SupertypeDescriptor> {
        flatten_supertypes(&self.supertypes)
    }

    /// 方法列表
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// 按名称查找参数最少的方法
    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .filter(|method| method.name == name)
            .min_by_key(|method| method.arity())
    }

    /// 工厂方法列表
    pub fn factories(&self) -> &[FactoryMethod] {
        &self.factories
    }

    /// 构造函数和字段声明的全部依赖
    pub fn dependencies(&self) -> impl Iterator<Item = &DependencySpec> {
        self.constructors
            .iter()
            .flat_map(|constructor| constructor.params.iter())
            .chain(self.fields.iter().map(|field| &field.dependency))
    }

    /// 将构造完成的值封装为共享实例
    pub fn seal(&self, value: Box<dyn Any + Send + Sync>) -> Result<Instance, DependencyError> {
        (self.seal)(value).ok_or_else(|| {
            DependencyError::type_mismatch(self.info.name, "构造函数返回了其他类型")
        })
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.info.name)
            .field("injectable", &self.injectable)
            .field("entry_point", &self.entry_point)
            .field("setup", &self.setup)
            .field("constructors", &self.constructors.len())
            .field("fields", &self.fields.len())
            .field("supertypes", &self.supertypes)
            .field("methods", &self.methods.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}

fn seal<C: Send + Sync + 'static>(value: Box<dyn Any + Send + Sync>) -> Option<Instance> {
    value
        .downcast::<C>()
        .ok()
        .map(|concrete| Instance::new(Arc::<C>::from(concrete)))
}

fn receiver<C: Send + Sync + 'static>(target: &Instance) -> Result<Arc<C>, DynError> {
    target.downcast::<C>().ok_or_else(|| {
        DependencyError::type_mismatch(std::any::type_name::<C>(), target.type_info().name).into()
    })
}

/// 类型描述符构建器
pub struct TypeDescriptorBuilder<C> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> TypeDescriptorBuilder<C> {
    fn new() -> Self {
        Self {
            descriptor: TypeDescriptor {
                info: TypeInfo::of::<C>(),
                injectable: None,
                entry_point: None,
                setup: false,
                constructors: Vec::new(),
                fields: Vec::new(),
                supertypes: Vec::new(),
                methods: Vec::new(),
                factories: Vec::new(),
                seal: seal::<C>,
            },
            _marker: PhantomData,
        }
    }

    /// 设置可注入标记
    pub fn injectable(mut self, marker: InjectableMarker) -> Self {
        self.descriptor.injectable = Some(marker);
        self
    }

    /// 设置启动入口标记
    pub fn entry_point(mut self, method_name: impl Into<String>) -> Self {
        self.descriptor.entry_point = Some(EntryPointMarker {
            method_name: method_name.into(),
        });
        self
    }

    /// 标记为配置类
    pub fn setup(mut self) -> Self {
        self.descriptor.setup = true;
        self
    }

    /// 添加无参构造函数
    pub fn constructor(self, build: impl Fn() -> C + Send + Sync + 'static) -> Self {
        self.constructor_with(Vec::new(), move |_| Ok(build()))
    }

    /// 添加带参数的构造函数
    pub fn constructor_with(
        mut self,
        params: Vec<DependencySpec>,
        build: impl Fn(&Arguments) -> Result<C, DynError> + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.constructors.push(ConstructorDescriptor {
            params,
            build: Arc::new(move |args: &Arguments| {
                build(args).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
        });
        self
    }

    /// 添加注入字段
    pub fn field<S: ?Sized + Send + Sync + 'static>(
        self,
        name: &'static str,
        qualifier: Option<&str>,
        assign: impl Fn(&mut C, Option<Arc<S>>) + Send + Sync + 'static,
    ) -> Self {
        let mut dependency = DependencySpec::of::<S>();
        dependency.qualifier = qualifier.map(str::to_string);
        self.push_field(name, dependency, assign)
    }

    /// 添加注入字段，依赖未注册时隐式注册
    pub fn field_auto<S: Injectable>(
        self,
        name: &'static str,
        qualifier: Option<&str>,
        assign: impl Fn(&mut C, Option<Arc<S>>) + Send + Sync + 'static,
    ) -> Self {
        let mut dependency = DependencySpec::auto::<S>();
        dependency.qualifier = qualifier.map(str::to_string);
        self.push_field(name, dependency, assign)
    }

    fn push_field<S: ?Sized + Send + Sync + 'static>(
        mut self,
        name: &'static str,
        dependency: DependencySpec,
        assign: impl Fn(&mut C, Option<Arc<S>>) + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.fields.push(FieldDescriptor {
            name,
            dependency,
            assign: Arc::new(
                move |target: &mut (dyn Any + Send + Sync), value: Option<&Instance>| {
                    if let Some(target) = target.downcast_mut::<C>() {
                        assign(target, value.and_then(Instance::downcast::<S>));
                    }
                },
            ),
        });
        self
    }

    /// 声明可作为别名的父类型
    pub fn provides<S: ?Sized + Send + Sync + 'static>(self, upcast: fn(Arc<C>) -> Arc<S>) -> Self {
        self.provides_with(SupertypeDescriptor::new(upcast))
    }

    /// 声明父类型（可携带继承的父类型）
    pub fn provides_with(mut self, supertype: SupertypeDescriptor) -> Self {
        self.descriptor.supertypes.push(supertype);
        self
    }

    /// 添加可调用的方法
    pub fn method<R: IntoInvocationResult>(
        mut self,
        name: &'static str,
        params: Vec<DependencySpec>,
        invoke: impl Fn(&C, &Arguments) -> R + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.methods.push(MethodDescriptor {
            name,
            params,
            invoke: Arc::new(move |target: &Instance, args: &Arguments| {
                let target = receiver::<C>(target)?;
                invoke(&target, args).into_invocation_result()
            }),
        });
        self
    }

    /// 添加工厂方法
    pub fn factory_method<R: IntoBean>(
        mut self,
        name: &'static str,
        produce: impl Fn(&C) -> R + Send + Sync + 'static,
    ) -> Self {
        self.descriptor.factories.push(FactoryMethod {
            name,
            produce: Arc::new(move |target: &Instance| {
                let target = receiver::<C>(target)?;
                produce(&target).into_bean()
            }),
        });
        self
    }

    /// 构建类型描述符
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    trait Labelled: Send + Sync {}

    #[derive(Default)]
    struct Widget {
        label: String,
        peer: Option<Arc<dyn Named>>,
    }

    impl Named for Widget {
        fn name(&self) -> &str {
            &self.label
        }
    }

    impl Labelled for Widget {}

    fn widget_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Widget>()
            .injectable(InjectableMarker::per_request().with_qualifier("w"))
            .constructor_with(
                vec![DependencySpec::of::<String>(), DependencySpec::of::<u32>()],
                |args| {
                    Ok(Widget {
                        label: args.arg::<String>(0).map(|s| (*s).clone()).unwrap_or_default(),
                        peer: None,
                    })
                },
            )
            .constructor(|| Widget {
                label: "nullary".to_string(),
                peer: None,
            })
            .field::<dyn Named>("peer", Some("other"), |this, value| this.peer = value)
            .provides_with(
                SupertypeDescriptor::new::<Widget, dyn Named>(|this| this)
                    .with_parent(SupertypeDescriptor::new::<Widget, dyn Labelled>(|this| this)),
            )
            .provides::<dyn Labelled>(|this| this)
            .method("rename", vec![], |_this: &Widget, _args| {})
            .build()
    }

    #[test]
    fn test_select_constructor_prefers_fewest_params() {
        let descriptor = widget_descriptor();
        assert!(descriptor.is_instantiable());
        assert_eq!(descriptor.constructors().len(), 2);

        let constructor = descriptor.select_constructor().unwrap();
        assert_eq!(constructor.arity(), 0);

        let value = constructor.build(&Arguments::default()).unwrap();
        let instance = descriptor.seal(value).unwrap();
        assert_eq!(instance.downcast::<Widget>().unwrap().label, "nullary");
    }

    #[test]
    fn test_field_assignment_through_erased_target() {
        let descriptor = widget_descriptor();
        assert!(descriptor.requires_field_injection());

        let mut value = descriptor
            .select_constructor()
            .unwrap()
            .build(&Arguments::default())
            .unwrap();
        let peer: Arc<dyn Named> = Arc::new(Widget {
            label: "peer".to_string(),
            peer: None,
        });
        let field = &descriptor.fields()[0];
        assert_eq!(field.dependency.qualifier.as_deref(), Some("other"));
        field.assign(&mut *value, Some(&Instance::new(peer)));

        let widget = descriptor.seal(value).unwrap().downcast::<Widget>().unwrap();
        assert_eq!(widget.peer.as_ref().unwrap().name(), "peer");
    }

    #[test]
    fn test_supertypes_flatten_depth_first_without_duplicates() {
        let descriptor = widget_descriptor();
        let names: Vec<_> = descriptor
            .all_supertypes()
            .iter()
            .map(|supertype| supertype.info)
            .collect();
        assert_eq!(
            names,
            vec![TypeInfo::of::<dyn Named>(), TypeInfo::of::<dyn Labelled>()]
        );
    }

    #[test]
    fn test_upcast_shares_allocation() {
        let descriptor = widget_descriptor();
        let concrete = Arc::new(Widget::default());
        let instance = Instance::new(concrete.clone());
        let alias = descriptor.supertypes()[0].upcast(&instance).unwrap();
        let named = alias.downcast::<dyn Named>().unwrap();
        assert!(std::ptr::eq(
            Arc::as_ptr(&named) as *const u8,
            Arc::as_ptr(&concrete) as *const u8
        ));
    }

    #[test]
    fn test_method_invocation_rejects_wrong_receiver() {
        let descriptor = widget_descriptor();
        let method = descriptor.find_method("rename").unwrap();
        assert!(method
            .invoke(&Instance::from_value(Widget::default()), &Arguments::default())
            .is_ok());
        assert!(method
            .invoke(&Instance::from_value(1_u8), &Arguments::default())
            .is_err());
        assert!(descriptor.find_method("missing").is_none());
    }
}
