//! 宏工具函数

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Ident, LitStr, Result, Type};

/// 从类型中提取第一个泛型参数
pub fn extract_generic_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(syn::GenericArgument::Type(inner_type)) => Some(inner_type),
            _ => None,
        },
        _ => None,
    }
}

/// 检查类型路径的最后一段是否为指定名称
fn is_type_named(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == name)
            .unwrap_or(false),
        _ => false,
    }
}

/// 提取 `Option<Arc<T>>` 中的 `T`
pub fn option_arc_inner(ty: &Type) -> Option<&Type> {
    if !is_type_named(ty, "Option") {
        return None;
    }
    let arc = extract_generic_type(ty)?;
    if !is_type_named(arc, "Arc") {
        return None;
    }
    extract_generic_type(arc)
}

/// 把创建策略名称转换为 `CreationStrategy` 变体
pub fn parse_strategy(lit: &LitStr) -> Result<TokenStream> {
    match lit.value().as_str() {
        "shared" | "singleton" => Ok(quote! { ::infrastructure_common::CreationStrategy::Shared }),
        "per_request" | "per-request" | "prototype" => {
            Ok(quote! { ::infrastructure_common::CreationStrategy::PerRequest })
        }
        other => Err(syn::Error::new(
            lit.span(),
            format!("未知的创建策略: {other}, 可选值: shared, per_request"),
        )),
    }
}

/// 把驼峰名称转换为蛇形名称
pub fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(ch.to_lowercase());
        } else {
            snake.push(ch);
        }
    }
    snake
}

/// 链接期登记函数名称
pub fn registration_fn_name(struct_name: &Ident) -> Ident {
    Ident::new(
        &format!(
            "__register_injectable_{}",
            to_snake_case(&struct_name.to_string())
        ),
        Span::call_site(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;
    use syn::parse_quote;

    #[test]
    fn test_option_arc_inner() {
        let field: Type = parse_quote!(Option<Arc<dyn Service2>>);
        let inner = option_arc_inner(&field).unwrap();
        assert_eq!(inner.to_token_stream().to_string(), "dyn Service2");

        let qualified: Type = parse_quote!(std::option::Option<std::sync::Arc<Config>>);
        assert!(option_arc_inner(&qualified).is_some());

        let plain: Type = parse_quote!(Option<String>);
        assert!(option_arc_inner(&plain).is_none());
        let bare: Type = parse_quote!(Arc<Config>);
        assert!(option_arc_inner(&bare).is_none());
    }

    #[test]
    fn test_parse_strategy() {
        let shared: LitStr = parse_quote!("singleton");
        assert!(parse_strategy(&shared).unwrap().to_string().ends_with("Shared"));

        let per_request: LitStr = parse_quote!("per_request");
        assert!(parse_strategy(&per_request)
            .unwrap()
            .to_string()
            .ends_with("PerRequest"));

        let unknown: LitStr = parse_quote!("scoped");
        assert!(parse_strategy(&unknown).is_err());
    }

    #[test]
    fn test_registration_fn_name() {
        let ident: Ident = parse_quote!(Service1Impl);
        assert_eq!(
            registration_fn_name(&ident).to_string(),
            "__register_injectable_service1_impl"
        );
    }
}
