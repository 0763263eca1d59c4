//! 组件创建策略

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 组件创建策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationStrategy {
    /// 共享模式 - 每个具体类型在容器生命周期内只创建一个实例
    Shared,
    /// 按请求模式 - 每次解析都创建新实例
    PerRequest,
}

impl Default for CreationStrategy {
    fn default() -> Self {
        Self::Shared
    }
}

impl CreationStrategy {
    /// 是否为共享模式
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Shared)
    }
}

impl fmt::Display for CreationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => f.write_str("shared"),
            Self::PerRequest => f.write_str("per_request"),
        }
    }
}

impl FromStr for CreationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" | "singleton" => Ok(Self::Shared),
            "per_request" | "per-request" | "prototype" => Ok(Self::PerRequest),
            _ => Err(ConfigError::invalid_value(
                "strategy",
                s,
                "shared | per_request",
            )),
        }
    }
}
