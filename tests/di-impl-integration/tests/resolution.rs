//! 解析规则：限定符回退、构造函数选择、缺失依赖策略、隐式注册

use component_macros::Injectable;
use di_abstractions::{
    ContainerConfig, DependencyManager, DependencyManagerExt, FailurePolicy,
};
use di_impl::DependencyManagerImpl;
use infrastructure_common::{
    DependencyError, DependencySpec, Injectable, InjectableMarker, TypeDescriptor, TypeInfo,
};
use std::sync::Arc;

pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Injectable)]
#[injectable(qualifier = "json", provides(dyn Codec))]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }
}

#[derive(Injectable)]
#[injectable(qualifier = "binary", provides(dyn Codec))]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }
}

#[derive(Injectable)]
#[injectable(provides(dyn Codec))]
pub struct DefaultCodec;

impl Codec for DefaultCodec {
    fn name(&self) -> &'static str {
        "default"
    }
}

#[test]
fn test_qualifier_fallback_is_deterministic() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![
        JsonCodec::type_descriptor(),
        BinaryCodec::type_descriptor(),
    ]);

    let codec = |qualifier: &str| {
        manager
            .get_qualified::<dyn Codec>(qualifier)
            .value::<dyn Codec>()
            .map(|codec| codec.name())
    };
    assert_eq!(codec("json"), Some("json"));
    // 既没有精确匹配也没有 default 时取字典序第一个
    for _ in 0..10 {
        assert_eq!(codec("xml"), Some("binary"));
    }
    assert_eq!(codec(""), Some("binary"));

    manager.initialize_with(vec![DefaultCodec::type_descriptor()]);
    assert_eq!(codec("xml"), Some("default"));
    assert_eq!(codec("json"), Some("json"));
}

#[test]
fn test_own_qualifier_is_the_default_for_concrete_lookup() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![JsonCodec::type_descriptor()]);

    assert!(manager.get::<JsonCodec>().found());
    assert!(manager.get_qualified::<JsonCodec>("json").found());
    let names = manager.registered_names();
    assert!(names.iter().any(|name| name.ends_with("JsonCodec")));
    assert!(names.iter().any(|name| name.contains("Codec") && name.starts_with("dyn")));
}

pub struct Engine {
    built_with: usize,
}

fn engine() -> TypeDescriptor {
    TypeDescriptor::builder::<Engine>()
        .injectable(InjectableMarker::shared())
        .constructor_with(
            vec![
                DependencySpec::of::<dyn Codec>(),
                DependencySpec::of::<JsonCodec>(),
            ],
            |_| Ok(Engine { built_with: 2 }),
        )
        .constructor(|| Engine { built_with: 0 })
        .constructor_with(vec![DependencySpec::of::<dyn Codec>()], |_| {
            Ok(Engine { built_with: 1 })
        })
        .build()
}

#[test]
fn test_fewest_parameter_constructor_wins() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![engine(), JsonCodec::type_descriptor()]);

    let engine = manager.get_instance::<Engine>().unwrap();
    assert_eq!(engine.built_with, 0);
}

pub struct Pipeline {
    codec: Option<Arc<dyn Codec>>,
}

fn pipeline() -> TypeDescriptor {
    TypeDescriptor::builder::<Pipeline>()
        .injectable(InjectableMarker::per_request())
        .constructor_with(
            vec![DependencySpec::of::<dyn Codec>().qualified("missing")],
            |args| {
                Ok(Pipeline {
                    codec: args.arg::<dyn Codec>(0),
                })
            },
        )
        .build()
}

#[test]
fn test_missing_dependency_is_injected_as_none_by_default() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![pipeline()]);

    let pipeline = manager.get_instance::<Pipeline>().unwrap();
    assert!(pipeline.codec.is_none());

    let silent = DependencyManagerImpl::with_config(
        ContainerConfig::default().with_missing_dependency(FailurePolicy::Silent),
    );
    silent.initialize_with(vec![self::pipeline()]);
    assert!(silent.get_instance::<Pipeline>().unwrap().codec.is_none());
}

#[test]
fn test_missing_dependency_fails_under_strict_config() {
    let manager = DependencyManagerImpl::with_config(ContainerConfig::strict());
    manager.initialize_with(vec![pipeline()]);

    match manager.try_get::<Pipeline>() {
        Err(DependencyError::MissingDependency {
            dependency,
            qualifier,
            ..
        }) => {
            assert!(dependency.contains("Codec"));
            assert_eq!(qualifier, "missing");
        }
        other => panic!("期望依赖缺失错误, 实际: {:?}", other.map(|r| r.found())),
    }
    assert!(matches!(
        manager.require::<Pipeline>(),
        Err(DependencyError::MissingDependency { .. })
    ));
}

#[test]
fn test_qualified_miss_falls_back_when_registered() {
    let manager = DependencyManagerImpl::with_config(ContainerConfig::strict());
    manager.initialize_with(vec![pipeline(), BinaryCodec::type_descriptor()]);

    let pipeline = manager.require::<Pipeline>().unwrap();
    assert_eq!(pipeline.codec.as_ref().unwrap().name(), "binary");
}

#[derive(Debug)]
pub struct Flaky;

#[test]
fn test_construction_error_policy() {
    let flaky = || {
        TypeDescriptor::builder::<Flaky>()
            .injectable(InjectableMarker::shared())
            .constructor_with(vec![], |_| Err("connection refused".into()))
            .build()
    };

    let lenient = DependencyManagerImpl::new();
    lenient.initialize_with(vec![flaky()]);
    let resolution = lenient.get::<Flaky>();
    assert!(resolution.found());
    assert!(resolution.value::<Flaky>().is_none());
    assert_eq!(lenient.singleton_count(), 0);

    let strict = DependencyManagerImpl::with_config(ContainerConfig::strict());
    strict.initialize_with(vec![flaky()]);
    let error = strict.require::<Flaky>().unwrap_err();
    assert!(matches!(error, DependencyError::ComponentCreationFailed { .. }));
    assert!(error.to_string().contains("connection refused"));
}

#[derive(Injectable)]
pub struct Clock;

#[derive(Injectable)]
#[injectable]
pub struct Scheduler {
    #[inject(auto)]
    clock: Option<Arc<Clock>>,
    #[inject]
    manager: Option<Arc<dyn DependencyManager>>,
    ticks: u64,
}

#[test]
fn test_implicit_registration_and_self_injection() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![Scheduler::type_descriptor()]);

    let scheduler = manager.require::<Scheduler>().unwrap();
    assert!(scheduler.clock.is_some());
    assert_eq!(scheduler.ticks, 0);
    assert!(manager.get::<Clock>().found());

    let injected = scheduler.manager.as_ref().unwrap();
    assert!(injected.is_initialized());
    assert_eq!(
        injected.try_resolve(&TypeInfo::of::<Clock>(), None).unwrap().resolved_type(),
        TypeInfo::of::<Clock>()
    );
}

#[test]
fn test_implicit_registration_can_be_disabled() {
    let manager = DependencyManagerImpl::with_config(
        ContainerConfig::default().with_implicit_registration(false),
    );
    manager.initialize_with(vec![Scheduler::type_descriptor()]);

    let scheduler = manager.require::<Scheduler>().unwrap();
    assert!(scheduler.clock.is_none());
    assert!(!manager.get::<Clock>().found());
}
