//! 注册信息

use infrastructure_common::{CreationStrategy, TypeInfo};
use std::fmt;

/// 注册来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationSource {
    /// 由类型描述符构造
    Type,
    /// 预构建实例
    Instance,
    /// 容器自身
    Container,
}

/// 单条注册信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    /// 请求类型（具体类型或父类型）
    pub requested: TypeInfo,
    /// 限定符
    pub qualifier: String,
    /// 具体类型
    pub concrete: TypeInfo,
    /// 创建策略
    pub strategy: CreationStrategy,
    /// 是否需要字段注入
    pub requires_field_injection: bool,
    /// 注册来源
    pub source: RegistrationSource,
}

impl RegistrationInfo {
    /// 是否为别名注册
    pub fn is_alias(&self) -> bool {
        self.requested != self.concrete
    }
}

impl fmt::Display for RegistrationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] -> {} ({})",
            self.requested.short_name(),
            self.qualifier,
            self.concrete.short_name(),
            self.strategy
        )
    }
}
