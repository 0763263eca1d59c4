//! 依赖管理器端到端场景
//!
//! 组件通过 `#[derive(Injectable)]` 声明，由显式候选列表注册。

use component_macros::Injectable;
use di_abstractions::{DependencyManager, DependencyManagerExt, RegistrationSource};
use di_impl::DependencyManagerImpl;
use infrastructure_common::{CreationStrategy, Injectable, TypeInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// `Service2Impl::execute` 的调用次数
static EXECUTIONS: AtomicUsize = AtomicUsize::new(0);

pub trait Service1: Send + Sync {
    fn execute(&self);
}

pub trait Service2: Send + Sync {
    fn execute(&self);
}

#[derive(Injectable)]
#[injectable(strategy = "per_request", qualifier = "Service2Impl", provides(dyn Service2))]
pub struct Service2Impl;

impl Service2 for Service2Impl {
    fn execute(&self) {
        EXECUTIONS.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Injectable)]
#[injectable(strategy = "per_request", qualifier = "Service1Impl", provides(dyn Service1))]
pub struct Service1Impl {
    #[inject(qualifier = "Service2Impl")]
    service2: Option<Arc<dyn Service2>>,
}

impl Service1 for Service1Impl {
    fn execute(&self) {
        if let Some(service2) = &self.service2 {
            service2.execute();
        }
    }
}

fn manager() -> DependencyManagerImpl {
    let manager = DependencyManagerImpl::builder()
        .with_candidates(vec![
            Service1Impl::type_descriptor(),
            Service2Impl::type_descriptor(),
        ])
        .build();
    manager.initialize();
    manager
}

#[test]
fn test_qualified_field_injection_through_trait_alias() {
    let manager = manager();

    let resolution = manager.get_qualified::<dyn Service1>("Service1Impl");
    assert!(resolution.found());
    assert_eq!(resolution.resolved_type(), TypeInfo::of::<Service1Impl>());

    let service1 = resolution.value::<dyn Service1>().unwrap();
    let before = EXECUTIONS.load(Ordering::SeqCst);
    service1.execute();
    assert_eq!(EXECUTIONS.load(Ordering::SeqCst), before + 1);

    let concrete = manager.get_instance::<Service1Impl>().unwrap();
    assert!(concrete.service2.is_some());
}

#[test]
fn test_per_request_aliases_are_fresh() {
    let manager = manager();
    let first = manager.get_instance::<dyn Service1>().unwrap();
    let second = manager.get_instance::<dyn Service1>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

pub struct Unregistered;

#[test]
fn test_unregistered_type_is_not_found() {
    let manager = manager();

    let resolution = manager.get::<Unregistered>();
    assert!(!resolution.found());
    assert!(resolution.value::<Unregistered>().is_none());
    assert_eq!(resolution.resolved_type(), TypeInfo::of::<Unregistered>());
}

#[derive(Injectable)]
#[injectable(strategy = "per_request")]
pub struct Preset {
    label: String,
}

#[test]
fn test_added_dependency_is_returned_every_time() {
    let manager = DependencyManagerImpl::builder()
        .with_candidates(vec![Preset::type_descriptor()])
        .build();
    manager.add_dependency(Preset {
        label: "X".to_string(),
    });
    manager.initialize();

    let first = manager.get_instance::<Preset>().unwrap();
    for _ in 0..5 {
        let again = manager.get_instance::<Preset>().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(first.label, "X");

    let registration = manager
        .registrations()
        .into_iter()
        .find(|info| info.requested.is::<Preset>())
        .unwrap();
    assert_eq!(registration.concrete, TypeInfo::of::<Preset>());
}

#[test]
fn test_added_dependency_keeps_requested_strategy_for_diagnostics() {
    let manager = DependencyManagerImpl::new();
    manager.add_dependency_with(
        Preset {
            label: "Y".to_string(),
        },
        CreationStrategy::PerRequest,
        "y",
    );

    let first = manager.get_qualified::<Preset>("y").value::<Preset>().unwrap();
    let second = manager.get_qualified::<Preset>("y").value::<Preset>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let registration = manager
        .registrations()
        .into_iter()
        .find(|info| info.requested.is::<Preset>())
        .unwrap();
    assert_eq!(registration.strategy, CreationStrategy::PerRequest);
    assert_eq!(registration.qualifier, "y");
}

pub trait Labelled: Send + Sync {
    fn label(&self) -> &str;
}

#[derive(Injectable)]
#[injectable(provides(dyn Labelled))]
pub struct Badge {
    text: String,
}

impl Labelled for Badge {
    fn label(&self) -> &str {
        &self.text
    }
}

#[test]
fn test_added_dependency_is_reachable_through_declared_aliases() {
    let manager = DependencyManagerImpl::builder()
        .with_candidates(vec![Badge::type_descriptor()])
        .build();
    manager.add_dependency(Badge {
        text: "X".to_string(),
    });
    manager.initialize();

    let concrete = manager.get_instance::<Badge>().unwrap();
    let alias = manager.get::<dyn Labelled>();
    assert!(alias.found());
    assert_eq!(alias.resolved_type(), TypeInfo::of::<Badge>());

    let labelled = alias.value::<dyn Labelled>().unwrap();
    assert_eq!(labelled.label(), "X");
    assert!(std::ptr::eq(
        Arc::as_ptr(&labelled) as *const (),
        Arc::as_ptr(&concrete) as *const ()
    ));

    let registration = manager
        .registrations()
        .into_iter()
        .find(|info| info.requested.is::<dyn Labelled>())
        .unwrap();
    assert_eq!(registration.concrete, TypeInfo::of::<Badge>());
    assert_eq!(registration.source, RegistrationSource::Instance);
}
