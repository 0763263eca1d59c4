//! `#[derive(Injectable)]` 实现

use crate::utils::{option_arc_inner, parse_strategy, registration_fn_name};
use proc_macro2::{Literal, Span, TokenStream};
use quote::quote;
use syn::{
    punctuated::Punctuated, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta, Result,
    Token, Type,
};

/// `#[injectable(...)]` 参数
#[derive(Default)]
struct InjectableArgs {
    strategy: Option<TokenStream>,
    qualifier: Option<String>,
    provides: Vec<Type>,
}

/// `#[bootable(...)]` 参数
struct BootableArgs {
    method: Ident,
    params: Vec<Type>,
}

/// `#[setup(...)]` 参数
#[derive(Default)]
struct SetupArgs {
    factories: Vec<Ident>,
}

/// 带 `#[inject]` 的字段
struct InjectField {
    ident: Ident,
    dependency: Type,
    qualifier: Option<String>,
    auto: bool,
}

fn has_arguments(attr: &Attribute) -> bool {
    matches!(attr.meta, Meta::List(_))
}

fn parse_injectable(attr: &Attribute) -> Result<InjectableArgs> {
    let mut args = InjectableArgs::default();
    if !has_arguments(attr) {
        return Ok(args);
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("strategy") {
            let value: LitStr = meta.value()?.parse()?;
            args.strategy = Some(parse_strategy(&value)?);
            Ok(())
        } else if meta.path.is_ident("qualifier") {
            let value: LitStr = meta.value()?.parse()?;
            args.qualifier = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("provides") {
            let content;
            syn::parenthesized!(content in meta.input);
            let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
            args.provides.extend(types);
            Ok(())
        } else {
            Err(meta.error("未知的 injectable 参数, 可选: strategy, qualifier, provides"))
        }
    })?;
    Ok(args)
}

fn parse_bootable(attr: &Attribute) -> Result<BootableArgs> {
    let mut method = Ident::new("initialize", Span::call_site());
    let mut params = Vec::new();
    if !has_arguments(attr) {
        return Ok(BootableArgs { method, params });
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("method") {
            let value: LitStr = meta.value()?.parse()?;
            method = value.parse()?;
            Ok(())
        } else if meta.path.is_ident("params") {
            let content;
            syn::parenthesized!(content in meta.input);
            params.extend(Punctuated::<Type, Token![,]>::parse_terminated(&content)?);
            Ok(())
        } else {
            Err(meta.error("未知的 bootable 参数, 可选: method, params"))
        }
    })?;
    Ok(BootableArgs { method, params })
}

fn parse_setup(attr: &Attribute) -> Result<SetupArgs> {
    let mut args = SetupArgs::default();
    if !has_arguments(attr) {
        return Ok(args);
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("factories") {
            let content;
            syn::parenthesized!(content in meta.input);
            args.factories
                .extend(Punctuated::<Ident, Token![,]>::parse_terminated(&content)?);
            Ok(())
        } else {
            Err(meta.error("未知的 setup 参数, 可选: factories"))
        }
    })?;
    Ok(args)
}

fn parse_inject(ident: &Ident, ty: &Type, attr: &Attribute) -> Result<InjectField> {
    let dependency = option_arc_inner(ty).cloned().ok_or_else(|| {
        syn::Error::new_spanned(ty, "注入字段的类型必须是 Option<Arc<T>>")
    })?;
    let mut field = InjectField {
        ident: ident.clone(),
        dependency,
        qualifier: None,
        auto: false,
    };
    if !has_arguments(attr) {
        return Ok(field);
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("qualifier") {
            let value: LitStr = meta.value()?.parse()?;
            field.qualifier = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("auto") {
            field.auto = true;
            Ok(())
        } else {
            Err(meta.error("未知的 inject 参数, 可选: qualifier, auto"))
        }
    })?;
    Ok(field)
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

/// 生成构造表达式和注入字段列表
fn constructor_and_fields(input: &DeriveInput) -> Result<(TokenStream, Vec<InjectField>)> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Injectable 只能用于结构体",
        ));
    };

    match &data.fields {
        Fields::Unit => Ok((quote! { Self }, Vec::new())),
        Fields::Named(named) => {
            let mut inits = Vec::new();
            let mut injected = Vec::new();
            for field in &named.named {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                match find_attr(&field.attrs, "inject") {
                    Some(attr) => {
                        injected.push(parse_inject(ident, &field.ty, attr)?);
                        inits.push(quote! { #ident: ::core::option::Option::None });
                    }
                    None => inits.push(quote! { #ident: ::core::default::Default::default() }),
                }
            }
            Ok((quote! { Self { #(#inits),* } }, injected))
        }
        Fields::Unnamed(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Injectable 不支持元组结构体",
        )),
    }
}

fn field_registration(field: &InjectField) -> TokenStream {
    let InjectField {
        ident,
        dependency,
        qualifier,
        auto,
    } = field;
    let name = ident.to_string();
    let qualifier = match qualifier {
        Some(q) => quote! { ::core::option::Option::Some(#q) },
        None => quote! { ::core::option::Option::None },
    };
    let register = if *auto {
        quote! { field_auto }
    } else {
        quote! { field }
    };
    quote! {
        .#register::<#dependency>(#name, #qualifier, |this: &mut Self, value| this.#ident = value)
    }
}

fn entry_registration(args: &BootableArgs) -> TokenStream {
    let method = &args.method;
    let method_name = method.to_string();
    let params = &args.params;
    let indices = (0..params.len()).map(Literal::usize_unsuffixed);
    quote! {
        .entry_point(#method_name)
        .method(
            #method_name,
            ::std::vec![#(::infrastructure_common::DependencySpec::of::<#params>()),*],
            |this: &Self, args: &::infrastructure_common::Arguments| {
                let _ = args;
                this.#method(#(args.arg::<#params>(#indices)),*)
            },
        )
    }
}

/// 实现 #[derive(Injectable)]
pub fn derive_injectable_impl(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Injectable 不支持泛型类型, 请为具体类型手写 TypeDescriptor",
        ));
    }

    let struct_name = &input.ident;
    let (constructor, fields) = constructor_and_fields(&input)?;
    let mut chain = Vec::new();

    if let Some(attr) = find_attr(&input.attrs, "injectable") {
        let args = parse_injectable(attr)?;
        let strategy = args
            .strategy
            .unwrap_or_else(|| quote! { ::infrastructure_common::CreationStrategy::Shared });
        let qualifier = args
            .qualifier
            .map(|q| quote! { .with_qualifier(#q) });
        chain.push(quote! {
            .injectable(::infrastructure_common::InjectableMarker::new(#strategy) #qualifier)
        });
        for supertype in &args.provides {
            chain.push(quote! { .provides::<#supertype>(|this| this) });
        }
    }

    if let Some(attr) = find_attr(&input.attrs, "bootable") {
        chain.push(entry_registration(&parse_bootable(attr)?));
    }

    if let Some(attr) = find_attr(&input.attrs, "setup") {
        chain.push(quote! { .setup() });
        for factory in parse_setup(attr)?.factories {
            let name = factory.to_string();
            chain.push(quote! { .factory_method(#name, |this: &Self| this.#factory()) });
        }
    }

    chain.push(quote! { .constructor(|| #constructor) });
    chain.extend(fields.iter().map(field_registration));

    let register_fn = registration_fn_name(struct_name);

    Ok(quote! {
        impl ::infrastructure_common::Injectable for #struct_name {
            fn type_descriptor() -> ::infrastructure_common::TypeDescriptor {
                ::infrastructure_common::TypeDescriptor::builder::<Self>()
                    #(#chain)*
                    .build()
            }
        }

        // 程序启动时登记到链接期类型目录
        #[doc(hidden)]
        #[::ctor::ctor]
        fn #register_fn() {
            ::infrastructure_common::register_linked_type(
                <#struct_name as ::infrastructure_common::Injectable>::type_descriptor,
            );
        }
    })
}
