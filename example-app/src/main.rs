//! # 示例应用程序
//!
//! 演示如何用 `#[derive(Injectable)]` 声明组件，并由启动器发现入口类型、
//! 初始化依赖管理器、注入入口方法参数后执行。

use anyhow::{Context, Result};
use clap::Parser;
use component_macros::Injectable;
use di_abstractions::DependencyManager;
use infrastructure_composition::{LoggingConfig, RunnerBuilder};
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 依赖管理器示例应用")]
struct Args {
    /// 容器配置文件路径（TOML 或 JSON）
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 输出 JSON 格式日志
    #[arg(long)]
    json_logs: bool,
}

/// 问候语设置，由启动参数预先提供
#[derive(Debug)]
pub struct Greeting {
    text: String,
}

/// 业务服务
pub trait Service1: Send + Sync {
    fn execute(&self);
}

/// 底层服务
pub trait Service2: Send + Sync {
    fn execute(&self);
}

#[derive(Injectable)]
#[injectable(strategy = "per_request", qualifier = "Service2Impl", provides(dyn Service2))]
pub struct Service2Impl {
    #[inject]
    greeting: Option<Arc<Greeting>>,
}

impl Service2 for Service2Impl {
    fn execute(&self) {
        match &self.greeting {
            Some(greeting) => info!("Service2Impl 执行: {}", greeting.text),
            None => info!("Service2Impl 执行"),
        }
    }
}

#[derive(Injectable)]
#[injectable(strategy = "per_request", provides(dyn Service1))]
pub struct Service1Impl {
    #[inject(qualifier = "Service2Impl")]
    service2: Option<Arc<dyn Service2>>,
}

impl Service1 for Service1Impl {
    fn execute(&self) {
        match &self.service2 {
            Some(service2) => service2.execute(),
            None => warn!("Service2 未注入"),
        }
    }
}

/// 应用入口
#[derive(Injectable)]
#[bootable(params(dyn Service1))]
pub struct Run;

impl Run {
    fn initialize(&self, service1: Option<Arc<dyn Service1>>) -> Result<(), String> {
        let service1 = service1.ok_or("Service1 未注册")?;
        service1.execute();
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level: tracing::Level = args
        .log_level
        .parse()
        .with_context(|| format!("无效的日志级别: {}", args.log_level))?;
    let logging = if args.json_logs {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    };

    let mut builder = RunnerBuilder::new()
        .with_scope(module_path!())
        .with_logging(logging.with_level(level))
        .with_beans(|beans| {
            beans.add_dependency(Greeting {
                text: "你好, Lorn ADSP".to_string(),
            })
        });
    if let Some(path) = &args.config {
        builder = builder
            .with_config_file(path)
            .with_context(|| format!("加载配置文件失败: {}", path))?;
    }

    let mut runner = builder.build().context("构建启动器失败")?;
    let manager = runner.run().context("应用启动失败")?;

    info!(
        "启动状态: {}, 已注册组件: {}",
        runner.state(),
        manager.registered_names().len()
    );
    Ok(())
}
