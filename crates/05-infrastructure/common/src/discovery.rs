//! 链接期类型目录
//!
//! `#[derive(Injectable)]` 生成的代码会在程序启动时（通过 `ctor`）把类型描述符
//! 函数登记到这里，类型发现服务再从这里读取候选类型。

use crate::component::TypeDescriptor;
use parking_lot::RwLock;

/// 类型描述符函数
pub type DescriptorFn = fn() -> TypeDescriptor;

/// 全局链接期类型目录
static LINKED_TYPES: once_cell::sync::Lazy<RwLock<Vec<DescriptorFn>>> =
    once_cell::sync::Lazy::new(|| RwLock::new(Vec::new()));

/// 登记一个类型描述符函数
pub fn register_linked_type(descriptor: DescriptorFn) {
    let mut types = LINKED_TYPES.write();
    if !types.iter().any(|known| *known as usize == descriptor as usize) {
        types.push(descriptor);
    }
}

/// 获取所有已登记的类型描述符函数（按登记顺序）
pub fn linked_types() -> Vec<DescriptorFn> {
    LINKED_TYPES.read().clone()
}
