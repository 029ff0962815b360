// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Expr, ExprLit, ExprUnary, Fields,
    GenericArgument, Ident, Lit, LitInt, LitStr, PathArguments, Type, UnOp,
};

/// Type-level `#[ua(...)]` attributes.
struct TypeAttrs {
    name: Option<String>,
    namespace: u16,
    id: Option<u32>,
    encoding_id: Option<u32>,
    base: Option<u32>,
}

/// Field-level `#[ua(...)]` attributes.
#[derive(Default)]
struct FieldAttrs {
    optional: bool,
    rename: Option<String>,
    rank: Option<u32>,
}

fn parse_type_attrs(attrs: &[Attribute]) -> syn::Result<TypeAttrs> {
    let mut out = TypeAttrs {
        name: None,
        namespace: 1,
        id: None,
        encoding_id: None,
        base: None,
    };
    for attr in attrs.iter().filter(|a| a.path().is_ident("ua")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("namespace") {
                out.namespace = meta.value()?.parse::<LitInt>()?.base10_parse()?;
            } else if meta.path.is_ident("id") {
                out.id = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("encoding_id") {
                out.encoding_id = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else if meta.path.is_ident("base") {
                out.base = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
            } else {
                return Err(meta.error("expected name, namespace, id, encoding_id or base"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("ua")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("optional") {
                out.optional = true;
            } else if meta.path.is_ident("rename") {
                out.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("rank") {
                let lit = meta.value()?.parse::<LitInt>()?;
                let rank: u32 = lit.base10_parse()?;
                if rank == 0 {
                    return Err(syn::Error::new_spanned(lit, "rank must be at least 1"));
                }
                out.rank = Some(rank);
            } else {
                return Err(meta.error("expected optional, rename or rank"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// `snake_case` to `PascalCase`; raw identifiers lose their prefix.
fn pascal_case(ident: &Ident) -> String {
    let raw = ident.to_string();
    let raw = raw.strip_prefix("r#").unwrap_or(&raw);
    raw.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `T` for a field declared `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn rank_tokens(rank: Option<u32>) -> proc_macro2::TokenStream {
    match rank {
        None => quote! {},
        Some(1) => quote! { .rank(::uacodec::typetree::ValueRank::OneDimension) },
        Some(n) => quote! { .rank(::uacodec::typetree::ValueRank::Matrix(#n)) },
    }
}

/// `#[derive(UaStructure)]`: compiled OPC UA structure or union codec.
///
/// A struct with named fields becomes a plain structure, or a structure
/// with optional fields when any field carries `#[ua(optional)]` (such a
/// field must be an `Option<T>`). An enum with exactly one unit variant
/// (the null value) and single-field tuple variants becomes a union whose
/// discriminants are the 1-based positions of the tuple variants.
///
/// Type attributes: `name = "..."`, `namespace = N` (default 1), `id = N`,
/// `encoding_id = N`, `base = N` (numeric id of the parent structure in the
/// same namespace). Field attributes: `optional`, `rename = "..."`,
/// `rank = N`.
///
/// ```ignore
/// #[derive(UaStructure)]
/// #[ua(namespace = 2, id = 5001, encoding_id = 5002)]
/// struct Sample {
///     foo: String,
///     #[ua(optional)]
///     bar: Option<u32>,
/// }
/// ```
#[proc_macro_derive(UaStructure, attributes(ua))]
pub fn derive_ua_structure(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_structure(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_structure(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic structures are not supported",
        ));
    }
    let attrs = parse_type_attrs(&input.attrs)?;
    let name = &input.ident;
    let type_name = attrs.name.clone().unwrap_or_else(|| name.to_string());
    let namespace = attrs.namespace;
    let id = attrs
        .id
        .ok_or_else(|| syn::Error::new_spanned(name, "missing #[ua(id = ...)]"))?;
    let encoding_id = attrs
        .encoding_id
        .ok_or_else(|| syn::Error::new_spanned(name, "missing #[ua(encoding_id = ...)]"))?;
    let base = attrs.base.map(|base| {
        quote! { .base(::uacodec::NodeId::numeric(#namespace, #base)) }
    });

    let body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_struct_body(&fields.named, base)?,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "only structs with named fields are supported",
                ))
            }
        },
        Data::Enum(data) => expand_union_body(&type_name, data, base)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(name, "Rust unions are not supported"))
        }
    };
    let StructureBody {
        kind,
        encode,
        decode,
        fields,
        base,
    } = body;

    Ok(quote! {
        impl ::uacodec::UaDataType for #name {
            fn data_type_id() -> ::uacodec::TypeId {
                ::uacodec::NodeId::numeric(#namespace, #id)
            }
        }

        impl ::uacodec::BinaryEncode for #name {
            fn encode(&self, enc: &mut ::uacodec::BinaryEncoder) -> ::uacodec::CodecResult<()> {
                #encode
            }
        }

        impl ::uacodec::BinaryDecode for #name {
            fn decode(dec: &mut ::uacodec::BinaryDecoder<'_>) -> ::uacodec::CodecResult<Self> {
                #decode
            }
        }

        impl ::uacodec::UaStructure for #name {
            const TYPE_NAME: &'static str = #type_name;

            fn binary_encoding_id() -> ::uacodec::NodeId {
                ::uacodec::NodeId::numeric(#namespace, #encoding_id)
            }

            fn definition() -> ::uacodec::typetree::StructureDefinition {
                ::uacodec::typetree::StructureDefinition::new(
                    ::uacodec::typetree::StructureKind::#kind,
                )
                #base
                #(#fields)*
            }
        }
    })
}

struct StructureBody {
    kind: Ident,
    encode: proc_macro2::TokenStream,
    decode: proc_macro2::TokenStream,
    fields: Vec<proc_macro2::TokenStream>,
    base: Option<proc_macro2::TokenStream>,
}

fn expand_struct_body(
    named: &syn::punctuated::Punctuated<syn::Field, syn::token::Comma>,
    base: Option<proc_macro2::TokenStream>,
) -> syn::Result<StructureBody> {
    let optional_count = named
        .iter()
        .map(|f| parse_field_attrs(&f.attrs).map(|a| a.optional))
        .collect::<syn::Result<Vec<_>>>()?
        .into_iter()
        .filter(|o| *o)
        .count();

    let mut encode = Vec::new();
    let mut decode = Vec::new();
    let mut fields = Vec::new();
    let mut mask_bits = Vec::new();
    let mut names = Vec::new();
    let mut bit = 0usize;

    for field in named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "field must have a name"))?;
        let attrs = parse_field_attrs(&field.attrs)?;
        let wire_name = attrs.rename.clone().unwrap_or_else(|| pascal_case(ident));
        let ty = &field.ty;
        let rank = rank_tokens(attrs.rank);
        names.push(ident.clone());

        if attrs.optional {
            let inner = option_inner(ty).ok_or_else(|| {
                syn::Error::new_spanned(ty, "#[ua(optional)] fields must be Option<T>")
            })?;
            mask_bits.push(quote! { mask.set(#bit, self.#ident.is_some()); });
            encode.push(quote! {
                if let ::std::option::Option::Some(value) = &self.#ident {
                    ::uacodec::BinaryEncode::encode(value, enc)?;
                }
            });
            decode.push(quote! {
                let #ident = if mask.is_set(#bit) {
                    ::std::option::Option::Some(
                        <#inner as ::uacodec::BinaryDecode>::decode(dec)?,
                    )
                } else {
                    ::std::option::Option::None
                };
            });
            fields.push(quote! {
                .field(::uacodec::structured::field_of::<#inner>(#wire_name)#rank.optional())
            });
            bit += 1;
        } else {
            encode.push(quote! {
                ::uacodec::BinaryEncode::encode(&self.#ident, enc)?;
            });
            decode.push(quote! {
                let #ident = <#ty as ::uacodec::BinaryDecode>::decode(dec)?;
            });
            fields.push(quote! {
                .field(::uacodec::structured::field_of::<#ty>(#wire_name)#rank)
            });
        }
    }

    let (kind, mask_encode, mask_decode) = if optional_count == 0 {
        (Ident::new("Plain", Span::call_site()), quote! {}, quote! {})
    } else {
        (
            Ident::new("WithOptionalFields", Span::call_site()),
            quote! {
                let mut mask = ::uacodec::structured::PresenceMask::new(#optional_count);
                #(#mask_bits)*
                mask.encode(enc)?;
            },
            quote! {
                let mask = ::uacodec::structured::PresenceMask::decode(dec, #optional_count)?;
            },
        )
    };

    Ok(StructureBody {
        kind,
        encode: quote! {
            #mask_encode
            #(#encode)*
            ::std::result::Result::Ok(())
        },
        decode: quote! {
            #mask_decode
            #(#decode)*
            ::std::result::Result::Ok(Self { #(#names),* })
        },
        fields,
        base,
    })
}

fn expand_union_body(
    type_name: &str,
    data: &DataEnum,
    base: Option<proc_macro2::TokenStream>,
) -> syn::Result<StructureBody> {
    let mut null_variant: Option<&Ident> = None;
    let mut encode = Vec::new();
    let mut decode = Vec::new();
    let mut fields = Vec::new();
    let mut discriminant = 0u32;

    for variant in &data.variants {
        let ident = &variant.ident;
        if variant.discriminant.is_some() {
            return Err(syn::Error::new_spanned(
                variant,
                "union variants take their discriminant from their position",
            ));
        }
        match &variant.fields {
            Fields::Unit => {
                if null_variant.replace(ident).is_some() {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "a union has exactly one unit (null) variant",
                    ));
                }
            }
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                let attrs = parse_field_attrs(&variant.attrs)?;
                if attrs.optional {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "union members cannot be optional",
                    ));
                }
                discriminant += 1;
                let ty = &unnamed.unnamed[0].ty;
                let wire_name = attrs.rename.clone().unwrap_or_else(|| ident.to_string());
                let rank = rank_tokens(attrs.rank);
                encode.push(quote! {
                    Self::#ident(value) => {
                        ::uacodec::structured::write_discriminant(enc, #discriminant);
                        ::uacodec::BinaryEncode::encode(value, enc)?;
                    }
                });
                decode.push(quote! {
                    #discriminant => ::std::result::Result::Ok(
                        Self::#ident(<#ty as ::uacodec::BinaryDecode>::decode(dec)?),
                    ),
                });
                fields.push(quote! {
                    .field(::uacodec::structured::field_of::<#ty>(#wire_name)#rank)
                });
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "union variants are a unit variant or hold exactly one value",
                ))
            }
        }
    }

    let null_variant = null_variant.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            "a union needs one unit variant for the null value",
        )
    })?;
    let variants = discriminant as usize;

    Ok(StructureBody {
        kind: Ident::new("Union", Span::call_site()),
        encode: quote! {
            match self {
                Self::#null_variant => ::uacodec::structured::write_discriminant(enc, 0),
                #(#encode)*
            }
            ::std::result::Result::Ok(())
        },
        decode: quote! {
            match ::uacodec::structured::read_discriminant(dec, #type_name, #variants)? {
                0 => ::std::result::Result::Ok(Self::#null_variant),
                #(#decode)*
                other => ::std::result::Result::Err(
                    ::uacodec::structured::unknown_discriminant(#type_name, other, #variants),
                ),
            }
        },
        fields,
        base,
    })
}

/// `#[derive(UaEnum)]`: OPC UA enumeration travelling as Int32.
///
/// Fieldless enums only. Values follow Rust discriminant rules: explicit
/// integer discriminants, otherwise one more than the previous variant.
/// Decoding a value with no variant fails with `InvalidData`.
///
/// ```ignore
/// #[derive(UaEnum)]
/// #[ua(namespace = 2, id = 3001)]
/// enum Mode {
///     Off = 0,
///     Auto = 1,
///     Manual = 4,
/// }
/// ```
#[proc_macro_derive(UaEnum, attributes(ua))]
pub fn derive_ua_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_enum(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_enum(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = parse_type_attrs(&input.attrs)?;
    let name = &input.ident;
    let type_name = attrs.name.clone().unwrap_or_else(|| name.to_string());
    let namespace = attrs.namespace;
    let id = attrs
        .id
        .ok_or_else(|| syn::Error::new_spanned(name, "missing #[ua(id = ...)]"))?;
    if attrs.encoding_id.is_some() || attrs.base.is_some() {
        return Err(syn::Error::new_spanned(
            name,
            "enumerations have no encoding id or base type",
        ));
    }
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "UaEnum applies to enums"));
    };

    let mut next = 0i64;
    let mut to_wire = Vec::new();
    let mut from_wire = Vec::new();
    let mut definition = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "enumeration variants cannot hold data",
            ));
        }
        let value = match &variant.discriminant {
            Some((_, expr)) => discriminant_value(expr)?,
            None => next,
        };
        let raw = i32::try_from(value).map_err(|_| {
            syn::Error::new_spanned(variant, "enumeration values must fit in Int32")
        })?;
        next = value + 1;

        let ident = &variant.ident;
        let wire_name = parse_field_attrs(&variant.attrs)?
            .rename
            .unwrap_or_else(|| ident.to_string());
        to_wire.push(quote! { Self::#ident => #raw, });
        from_wire.push(quote! { #raw => ::std::result::Result::Ok(Self::#ident), });
        definition.push(quote! { .variant(#wire_name, #value) });
    }

    Ok(quote! {
        impl ::uacodec::UaDataType for #name {
            fn data_type_id() -> ::uacodec::TypeId {
                ::uacodec::NodeId::numeric(#namespace, #id)
            }
        }

        impl ::uacodec::BinaryEncode for #name {
            fn encode(&self, enc: &mut ::uacodec::BinaryEncoder) -> ::uacodec::CodecResult<()> {
                let raw: i32 = match self {
                    #(#to_wire)*
                };
                enc.write_i32(raw);
                ::std::result::Result::Ok(())
            }
        }

        impl ::uacodec::BinaryDecode for #name {
            fn decode(dec: &mut ::uacodec::BinaryDecoder<'_>) -> ::uacodec::CodecResult<Self> {
                match dec.read_i32()? {
                    #(#from_wire)*
                    other => ::std::result::Result::Err(::uacodec::CodecError::InvalidData {
                        reason: ::std::format!("{} has no value {}", #type_name, other),
                    }),
                }
            }
        }

        impl ::uacodec::UaEnumeration for #name {
            const TYPE_NAME: &'static str = #type_name;

            fn definition() -> ::uacodec::typetree::EnumDefinition {
                ::uacodec::typetree::EnumDefinition::new()
                #(#definition)*
            }
        }
    })
}

/// Integer value of a discriminant expression: a literal, optionally negated.
fn discriminant_value(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => discriminant_value(expr).map(|v| -v),
        Expr::Group(group) => discriminant_value(&group.expr),
        Expr::Paren(paren) => discriminant_value(&paren.expr),
        other => Err(syn::Error::new_spanned(
            other,
            "enumeration discriminants must be integer literals",
        )),
    }
}
