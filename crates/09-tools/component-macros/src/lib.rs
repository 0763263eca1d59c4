//! # Component Macros
//!
//! 这个 crate 提供 `#[derive(Injectable)]`，为结构体生成类型描述符并在程序启动时
//! 登记到链接期类型目录。
//!
//! ## 属性
//!
//! - `#[injectable(strategy = "shared" | "per_request", qualifier = "...", provides(dyn A, dyn B))]`
//!   可注入标记，声明创建策略、限定符和可作为别名的父类型
//! - `#[bootable(method = "initialize", params(dyn A, B))]` 启动入口标记，入口方法接收
//!   `Option<Arc<T>>` 参数
//! - `#[setup(factories(a, b))]` 配置类标记，工厂方法的返回值注册为依赖
//! - 字段上的 `#[inject]`、`#[inject(qualifier = "...")]`、`#[inject(auto)]`，
//!   字段类型必须是 `Option<Arc<T>>`
//!
//! 生成的无参构造函数把注入字段设为 `None`，其余字段使用 `Default::default()`。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::Injectable;
//! use std::sync::Arc;
//!
//! pub trait Service2: Send + Sync {
//!     fn execute(&self);
//! }
//!
//! #[derive(Injectable)]
//! #[injectable(strategy = "per_request", qualifier = "test", provides(dyn Service2))]
//! pub struct Service2Impl;
//!
//! #[derive(Injectable)]
//! #[injectable(strategy = "per_request")]
//! pub struct Service1Impl {
//!     #[inject(qualifier = "test")]
//!     service2: Option<Arc<dyn Service2>>,
//! }
//! ```
//!
//! 使用方需要依赖 `infrastructure-common` 和 `ctor`。

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod component;
mod utils;

/// 可注入组件派生宏
///
/// 实现 `Injectable` trait，并通过 `ctor` 把类型登记到链接期类型目录。
/// 不支持泛型类型、枚举和元组结构体。
#[proc_macro_derive(Injectable, attributes(injectable, inject, bootable, setup))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_injectable_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
