//! # 依赖管理器实现
//!
//! 提供 [`DependencyManagerImpl`]：注册表、解析引擎、实例化引擎和生命周期管理。
//!
//! ## 解析规则
//!
//! - 注册以（请求类型，限定符）为键，先注册者保留
//! - 限定符回退：精确匹配，然后 `"default"`，然后字典序第一个
//! - 构造函数选择参数最少的一个，之后进行字段注入
//! - 缺失的依赖按 [`FailurePolicy`](di_abstractions::FailurePolicy) 处理，默认注入空值并告警
//! - 共享实例按具体类型缓存，并发首次解析只创建一次

mod descriptor;
mod instantiation;
mod lifecycle;
mod registry;

pub mod catalog;
pub mod manager;

pub use catalog::{LinkedTypeCatalog, StaticTypeCatalog};
pub use descriptor::Descriptor;
pub use manager::{DependencyManagerBuilder, DependencyManagerImpl};
