//! # Dependency Injection Abstractions
//!
//! 依赖管理器抽象层，定义组件注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`DependencyManager`] - 依赖管理器接口
//! - [`DependencyManagerExt`] - 泛型便捷方法
//! - [`TypeDiscovery`] - 类型发现接口
//! - [`Resolution`] - 解析结果
//! - [`ContainerConfig`] - 容器配置

pub mod container;
pub mod discovery;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use discovery::*;
pub use registry::*;
pub use resolver::*;
