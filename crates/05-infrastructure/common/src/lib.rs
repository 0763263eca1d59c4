//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖管理器各层共享的类型和工具。
//!
//! ## 核心组件
//!
//! - [`TypeDescriptor`] - 类型描述符，替代运行时反射
//! - [`Injectable`] - 可注入组件 trait
//! - [`Instance`] - 类型擦除的共享实例
//! - [`Bean`] - 预构建的组件实例
//! - [`CreationStrategy`] - 组件创建策略
//! - [`DependencyError`] / [`ConfigError`] - 错误类型
//!
//! ## 设计原则
//!
//! - 类型能力在注册时一次性描述，解析过程中不做反射
//! - 以 `TypeId` 作为稳定的注册键
//! - 链接期自动登记，无需手工维护类型清单

pub mod component;
pub mod discovery;
pub mod errors;
pub mod instance;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use discovery::*;
pub use errors::*;
pub use instance::*;
pub use lifecycle::*;
pub use metadata::*;
