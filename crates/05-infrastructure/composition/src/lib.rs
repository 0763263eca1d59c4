//! # 应用启动组合层
//!
//! 这个 crate 把类型发现服务和依赖管理器组合成一个可运行的应用启动流程。
//!
//! ## 主要功能
//!
//! - **启动器构建器**: 使用构建者模式组装启动器
//! - **启动状态机**: 查找入口类型，初始化依赖管理器，解析入口实例并调用入口方法
//! - **预构建实例**: 启动前注册外部创建的对象
//! - **日志初始化**: 开发/生产环境日志预设
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{LoggingConfig, RunnerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runner = RunnerBuilder::new()
//!         .with_scope("my_app")
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     let _manager = runner.run()?;
//!     Ok(())
//! }
//! ```

pub mod beans;
pub mod builder;
pub mod errors;
pub mod runner;

pub use beans::BeansBuilder;
pub use builder::{init_logging, LoggingConfig, RunnerBuilder};
pub use errors::{ApplicationInitializeError, InitializeResult};
pub use runner::{ApplicationRunner, RunnerState};
