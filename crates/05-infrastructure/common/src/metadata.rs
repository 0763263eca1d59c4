//! 元数据定义
//!
//! 提供类型标识和限定符相关的元数据信息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 默认限定符
pub const DEFAULT_QUALIFIER: &str = "default";

/// 规范化限定符，缺失或空字符串视为默认限定符
pub fn normalize_qualifier(qualifier: Option<&str>) -> &str {
    match qualifier {
        Some(qualifier) if !qualifier.is_empty() => qualifier,
        _ => DEFAULT_QUALIFIER,
    }
}

/// 类型信息
///
/// 编译期确定的稳定类型标识，trait 对象使用 `dyn Trait` 的 `TypeId`。
/// 相等性和哈希只取决于 `id`。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称
    pub name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        let short = base.rsplit("::").next().unwrap_or(base);
        if base.len() == self.name.len() {
            short
        } else {
            // 泛型类型保留参数部分
            &self.name[base.len() - short.len()..]
        }
    }

    /// 获取类型所在的模块路径
    pub fn module_path(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        let base = base.strip_prefix("dyn ").unwrap_or(base);
        base.rsplit_once("::").map_or("", |(module, _)| module)
    }

    /// 是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
