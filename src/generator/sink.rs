//! The emission seam: finished classes leave the compiler through a
//! [`ClassSink`]. The shipped implementation renders Rust source; tests and
//! embedders can substitute anything else.

use std::collections::BTreeMap;

use check_keyword::CheckKeyword;
use quote::format_ident;
use syn::__private::Span;
use syn::{parse_quote, Ident};
use thiserror::Error;

use super::class::{ClassBody, ClassDef, Field, Occurs};

/// What the sink wants the run to do after an artifact was handed over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SinkResponse {
    Continue,
    /// Request cooperative abort of the whole run.
    Stop,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write class {class}: {source}")]
    Io {
        class: String,
        source: std::io::Error,
    },
}

/// Receives every finished class exactly once. A failure is reported to the
/// caller's diagnostics and does not abort the run by itself.
pub trait ClassSink {
    fn accept(&mut self, class: &ClassDef) -> Result<SinkResponse, SinkError>;
}

/// Renders accepted classes into Rust source, one module per package.
#[derive(Default)]
pub struct RustSourceSink {
    modules: BTreeMap<String, Vec<syn::Item>>,
}

/// One finished output unit of the [`RustSourceSink`].
pub struct RenderedModule {
    pub package: Option<String>,
    pub source: String,
}

impl RustSourceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<RenderedModule> {
        self.modules
            .into_iter()
            .map(|(package, items)| {
                let file = syn::File {
                    shebang: None,
                    attrs: vec![],
                    items,
                };
                RenderedModule {
                    package: (!package.is_empty()).then_some(package),
                    source: prettyplease::unparse(&file),
                }
            })
            .collect()
    }
}

impl ClassSink for RustSourceSink {
    fn accept(&mut self, class: &ClassDef) -> Result<SinkResponse, SinkError> {
        let items = self
            .modules
            .entry(class.package.clone().unwrap_or_default())
            .or_default();
        items.extend(render_class(class));
        Ok(SinkResponse::Continue)
    }
}

fn render_class(class: &ClassDef) -> Vec<syn::Item> {
    let name = name_to_ident(&class.name);
    match &class.body {
        ClassBody::Struct { fields } => {
            let fields: Vec<syn::Field> = fields.iter().map(render_field).collect();
            let mut item: syn::ItemStruct = parse_quote! {
                #[derive(Debug, Clone, PartialEq)]
                pub struct #name {
                    #(#fields),*
                }
            };
            if let Some(documentation) = &class.documentation {
                item.attrs.insert(0, parse_quote!(#[doc = #documentation]));
            }
            vec![item.into()]
        }
        ClassBody::Enum { variants } => {
            let idents: Vec<Ident> = variants
                .iter()
                .map(|variant| name_to_ident(&variant.name))
                .collect();
            let values: Vec<&str> = variants
                .iter()
                .map(|variant| variant.value.as_str())
                .collect();
            let mut item: syn::ItemEnum = parse_quote! {
                #[derive(Debug, Clone, Copy, PartialEq, Eq)]
                pub enum #name {
                    #(#idents),*
                }
            };
            if let Some(documentation) = &class.documentation {
                item.attrs.insert(0, parse_quote!(#[doc = #documentation]));
            }
            // Lexical values survive as an accessor on the generated enum.
            let as_str: syn::ItemImpl = parse_quote! {
                impl #name {
                    pub fn as_str(&self) -> &'static str {
                        match self {
                            #(Self::#idents => #values),*
                        }
                    }
                }
            };
            vec![item.into(), as_str.into()]
        }
    }
}

fn render_field(field: &Field) -> syn::Field {
    let name = name_to_ident(&field.name);
    let type_name = name_to_ident(&field.type_name);
    let ty: syn::Type = match field.occurs {
        Occurs::One => parse_quote!(#type_name),
        Occurs::Optional => parse_quote!(Option<#type_name>),
        Occurs::Many => parse_quote!(Vec<#type_name>),
    };
    syn::Field {
        attrs: vec![],
        vis: parse_quote!(pub),
        mutability: syn::FieldMutability::None,
        ident: Some(name),
        colon_token: Some(Default::default()),
        ty,
    }
}

fn name_to_ident(name: &str) -> Ident {
    if ["crate", "self", "super", "Self"].contains(&name) {
        // These are keywords that are not allowed as raw identifiers
        Ident::new(&format!("{}_", name), Span::call_site())
    } else if name.is_keyword() {
        Ident::new_raw(name, Span::call_site())
    } else {
        format_ident!("{}", name)
    }
}
