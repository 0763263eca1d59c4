//! 生命周期：共享实例身份、并发首次解析、循环依赖

use component_macros::Injectable;
use di_abstractions::{DependencyManager, DependencyManagerExt};
use di_impl::DependencyManagerImpl;
use infrastructure_common::{DependencyError, Injectable, TypeInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

pub trait Cache: Send + Sync {
    fn id(&self) -> usize;
}

pub trait Store: Send + Sync {}

static CACHES_CREATED: AtomicUsize = AtomicUsize::new(0);

#[derive(Injectable)]
#[injectable(provides(dyn Cache, dyn Store))]
pub struct MemoryCache {
    id: Slot,
}

/// 构造时分配编号
pub struct Slot(usize);

impl Default for Slot {
    fn default() -> Self {
        std::thread::sleep(std::time::Duration::from_millis(10));
        Self(CACHES_CREATED.fetch_add(1, Ordering::SeqCst))
    }
}

impl Cache for MemoryCache {
    fn id(&self) -> usize {
        self.id.0
    }
}

impl Store for MemoryCache {}

#[test]
fn test_shared_instance_is_identical_across_aliases() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![MemoryCache::type_descriptor()]);

    let concrete = manager.get_instance::<MemoryCache>().unwrap();
    let cache = manager.get_instance::<dyn Cache>().unwrap();
    let again = manager.get_instance::<dyn Cache>().unwrap();
    assert_eq!(cache.id(), concrete.id());
    assert!(Arc::ptr_eq(&cache, &again));
    assert!(manager.get_instance::<dyn Store>().is_some());
    assert_eq!(manager.singleton_count(), 1);
}

#[test]
fn test_concurrent_first_resolution_through_different_aliases() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![MemoryCache::type_descriptor()]);
    let barrier = Barrier::new(6);

    let ids: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let manager = &manager;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        manager.require::<dyn Cache>().map(|cache| cache.id())
                    } else {
                        manager.require::<MemoryCache>().map(|cache| cache.id())
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect()
    });

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(manager.singleton_count(), 1);
}

#[derive(Injectable)]
#[injectable(strategy = "per_request")]
pub struct Request {
    serial: Slot,
}

#[test]
fn test_per_request_instances_are_distinct() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![Request::type_descriptor()]);

    let first = manager.require::<Request>().unwrap();
    let second = manager.require::<Request>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.serial.0, second.serial.0);
    assert_eq!(manager.singleton_count(), 0);
}

pub trait Bird: Send + Sync {}

#[derive(Injectable)]
#[injectable(provides(dyn Bird))]
pub struct Chicken {
    #[inject]
    egg: Option<Arc<Egg>>,
}

#[derive(Injectable)]
#[injectable]
pub struct Egg {
    #[inject]
    chicken: Option<Arc<Chicken>>,
}

impl Bird for Chicken {}

#[test]
fn test_field_injection_cycle_is_detected() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![Chicken::type_descriptor(), Egg::type_descriptor()]);

    match manager.try_get::<Chicken>() {
        Err(DependencyError::CircularDependency { dependency_chain }) => {
            assert_eq!(dependency_chain, "Chicken -> Egg -> Chicken");
        }
        other => panic!("期望循环依赖错误, 实际: {:?}", other.map(|r| r.found())),
    }

    // 宽松入口把错误记录下来，报告为命中但无实例
    let resolution = manager.get::<Egg>();
    assert!(resolution.found());
    assert!(resolution.value::<Egg>().is_none());
    assert_eq!(manager.singleton_count(), 0);
    assert!(manager.is_initialized());
}

#[test]
fn test_failed_alias_resolution_reports_concrete_type() {
    let manager = DependencyManagerImpl::new();
    manager.initialize_with(vec![Chicken::type_descriptor(), Egg::type_descriptor()]);

    let resolution = manager.get::<dyn Bird>();
    assert!(resolution.found());
    assert!(resolution.value::<dyn Bird>().is_none());
    assert_eq!(resolution.resolved_type(), TypeInfo::of::<Chicken>());
}

#[test]
fn test_reinitialize_keeps_first_registration() {
    let manager = DependencyManagerImpl::new();
    assert_eq!(manager.initialize_with(vec![MemoryCache::type_descriptor()]), 3);
    let first = manager.require::<dyn Cache>().unwrap();

    assert_eq!(manager.initialize_with(vec![MemoryCache::type_descriptor()]), 0);
    let second = manager.require::<dyn Cache>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
