//! 启动器端到端测试
//!
//! 类型由 `#[derive(Injectable)]` 登记到链接期类型目录，每个子模块是一个独立的扫描范围。

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

mod greeting {
    use component_macros::Injectable;
    use di_abstractions::{DependencyManager, DependencyManagerExt, TypeDiscovery};
    use di_impl::LinkedTypeCatalog;
    use infrastructure_common::Bean;
    use infrastructure_composition::{RunnerBuilder, RunnerState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static RUNS: AtomicUsize = AtomicUsize::new(0);

    pub trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    pub struct Endpoint {
        pub url: String,
    }

    #[derive(Injectable)]
    #[injectable(provides(dyn Greeter))]
    pub struct PoliteGreeter {
        #[inject]
        endpoint: Option<Arc<Endpoint>>,
    }

    impl Greeter for PoliteGreeter {
        fn greet(&self) -> String {
            match &self.endpoint {
                Some(endpoint) => format!("你好, {}", endpoint.url),
                None => "你好".to_string(),
            }
        }
    }

    #[derive(Injectable)]
    #[setup(factories(endpoint, nothing))]
    pub struct Wiring;

    impl Wiring {
        fn endpoint(&self) -> Bean {
            Bean::new(Endpoint {
                url: "tcp://localhost:7000".to_string(),
            })
        }

        fn nothing(&self) -> Option<Bean> {
            None
        }
    }

    #[derive(Injectable)]
    #[bootable(method = "run", params(dyn Greeter))]
    pub struct Main;

    impl Main {
        fn run(&self, greeter: Option<Arc<dyn Greeter>>) -> Result<(), String> {
            let greeter = greeter.ok_or("缺少 Greeter")?;
            if greeter.greet() != "你好, tcp://localhost:7000" {
                return Err(format!("意外的问候语: {}", greeter.greet()));
            }
            RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_linked_catalog_respects_scope() {
        let names: Vec<&str> = LinkedTypeCatalog::new()
            .find_in(module_path!())
            .iter()
            .map(|descriptor| descriptor.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "bootstrap::greeting::Main",
                "bootstrap::greeting::PoliteGreeter",
                "bootstrap::greeting::Wiring",
            ]
        );
    }

    #[test]
    fn test_run_derived_entry_with_setup_factories() {
        super::init_test_logger();
        let mut runner = RunnerBuilder::new()
            .with_scope(module_path!())
            .build()
            .unwrap();

        let manager = runner.run().unwrap();
        assert_eq!(runner.state(), RunnerState::Executed);
        assert_eq!(RUNS.load(Ordering::SeqCst), 1);
        assert!(manager.is_initialized());
        assert!(manager.get::<Main>().found());
        assert!(manager.get_instance::<dyn TypeDiscovery>().is_some());
        assert_eq!(
            manager.get_instance::<Endpoint>().unwrap().url,
            "tcp://localhost:7000"
        );
    }
}

mod headless {
    use component_macros::Injectable;
    use infrastructure_composition::{ApplicationInitializeError, RunnerBuilder, RunnerState};

    #[derive(Injectable)]
    #[injectable]
    pub struct Worker;

    #[test]
    fn test_scope_without_entry_is_fatal() {
        super::init_test_logger();
        let mut runner = RunnerBuilder::new()
            .with_scope(module_path!())
            .build()
            .unwrap();

        match runner.run() {
            Err(ApplicationInitializeError::EntryTypeNotFound { scope }) => {
                assert_eq!(scope, "bootstrap::headless");
            }
            other => panic!("期望找不到入口类型, 实际: {:?}", other.map(|_| ())),
        }
        assert_eq!(runner.state(), RunnerState::ClassesDiscovered);
    }
}

mod broken {
    use component_macros::Injectable;
    use infrastructure_composition::{ApplicationInitializeError, RunnerBuilder, RunnerState};

    #[derive(Injectable)]
    #[bootable]
    pub struct Main {
        attempts: u32,
    }

    impl Main {
        fn initialize(&self) -> Result<(), std::io::Error> {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("第 {} 次启动失败", self.attempts + 1),
            ))
        }
    }

    #[test]
    fn test_entry_failure_is_wrapped() {
        super::init_test_logger();
        let mut runner = RunnerBuilder::new()
            .with_scope(module_path!())
            .build()
            .unwrap();

        let error = runner.run().unwrap_err();
        assert!(matches!(
            error,
            ApplicationInitializeError::InvocationFailed { ref method_name, .. } if method_name == "initialize"
        ));
        assert!(std::error::Error::source(&error)
            .unwrap()
            .to_string()
            .contains("第 1 次启动失败"));
        assert_eq!(runner.state(), RunnerState::EntryResolved);
    }
}
