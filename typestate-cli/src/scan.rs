//! Source discovery and scanning.
//!
//! The tool runs outside compilation, so it reconstructs everything from
//! source text: walk the argument paths for `.rs` files, parse each with
//! `syn`, and pull out `typestate!` invocations (their body token streams,
//! spans intact) and every function, noting whether it is marked
//! `#[transition]`, `#[not_a_transition]`, or not at all. Functions are
//! collected from the top level, from nested inline modules, and from
//! `impl` blocks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use proc_macro2::TokenStream;
use syn::spanned::Spanned;
use walkdir::WalkDir;

/// One source file, read into memory.
pub struct SourceUnit {
    pub label: String,
    pub text: String,
}

/// Collects `.rs` files from the given paths in deterministic order.
pub fn load_units(paths: &[PathBuf]) -> Result<Vec<SourceUnit>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "rs")
                {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    let mut units = Vec::new();
    for file in files {
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        tracing::debug!(path = %file.display(), bytes = text.len(), "loaded source file");
        units.push(SourceUnit {
            label: file.display().to_string(),
            text,
        });
    }
    Ok(units)
}

/// How a scanned function is annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Transition,
    NotATransition,
    Unmarked,
}

/// A `typestate!` invocation found in a file.
pub struct FoundDecl {
    pub line: usize,
    pub tokens: TokenStream,
}

/// A function found in a file, reduced to what verification needs.
pub struct FoundFn {
    pub line: usize,
    pub name: String,
    pub marker: Marker,
    /// Display name of the first parameter's type, when it has one.
    pub source: Option<String>,
    /// Display name of the return type, when it has one.
    pub dest: Option<String>,
}

pub struct ScannedFile {
    pub decls: Vec<FoundDecl>,
    pub fns: Vec<FoundFn>,
}

/// Parses one source file and extracts declarations and functions.
pub fn scan_unit(unit: &SourceUnit) -> syn::Result<ScannedFile> {
    let file = syn::parse_file(&unit.text)?;
    let mut scanned = ScannedFile {
        decls: Vec::new(),
        fns: Vec::new(),
    };
    collect_items(&file.items, &mut scanned);
    Ok(scanned)
}

fn collect_items(items: &[syn::Item], out: &mut ScannedFile) {
    for item in items {
        match item {
            syn::Item::Macro(item_macro) if is_typestate_macro(&item_macro.mac.path) => {
                out.decls.push(FoundDecl {
                    line: item_macro.mac.path.span().start().line,
                    tokens: item_macro.mac.tokens.clone(),
                });
            }
            syn::Item::Fn(func) => {
                out.fns.push(found_fn(&func.attrs, &func.sig));
            }
            syn::Item::Mod(module) => {
                if let Some((_, items)) = &module.content {
                    collect_items(items, out);
                }
            }
            syn::Item::Impl(item_impl) => {
                for impl_item in &item_impl.items {
                    if let syn::ImplItem::Fn(method) = impl_item {
                        out.fns.push(found_fn(&method.attrs, &method.sig));
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_typestate_macro(path: &syn::Path) -> bool {
    path.segments
        .last()
        .is_some_and(|segment| segment.ident == "typestate")
}

fn found_fn(attrs: &[syn::Attribute], sig: &syn::Signature) -> FoundFn {
    let marker = attrs
        .iter()
        .find_map(|attr| match attr.path().segments.last() {
            Some(segment) if segment.ident == "transition" => Some(Marker::Transition),
            Some(segment) if segment.ident == "not_a_transition" => Some(Marker::NotATransition),
            _ => None,
        })
        .unwrap_or(Marker::Unmarked);

    FoundFn {
        line: sig.ident.span().start().line,
        name: sig.ident.to_string(),
        marker,
        source: first_param_state(sig),
        dest: return_state(sig),
    }
}

fn first_param_state(sig: &syn::Signature) -> Option<String> {
    match sig.inputs.first()? {
        syn::FnArg::Typed(param) => state_name(&param.ty),
        syn::FnArg::Receiver(_) => None,
    }
}

fn return_state(sig: &syn::Signature) -> Option<String> {
    match &sig.output {
        syn::ReturnType::Type(_, ty) => state_name(ty),
        syn::ReturnType::Default => None,
    }
}

/// Display name of a type: the last path segment, with references and
/// parentheses looked through.
fn state_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Reference(reference) => state_name(&reference.elem),
        syn::Type::Paren(paren) => state_name(&paren.elem),
        syn::Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
}
