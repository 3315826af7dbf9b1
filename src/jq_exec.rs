//! jq pre-processing of input documents (via jaq).
use std::fmt::Write;

use anyhow::{Context, Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output becomes a separate document.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(format_parse_errors)?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut documents = Vec::new();
    for (ix, item) in outputs.enumerate() {
        let val = item.map_err(|e| anyhow!("jq runtime error on output {ix}: {e:?}"))?;
        // Val's Display is JSON text
        let text = val.to_string();
        let document = serde_json::from_str(&text)
            .with_context(|| format!("jq output {ix} is not valid JSON: {text}"))?;
        documents.push(document);
    }
    Ok(documents)
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let mut message = String::new();
    for (file, err) in errs {
        let _ = writeln!(message, "jq parse error: {err:?} in `{}`", file.code);
    }
    anyhow!(message)
}

fn format_undefined_errors(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> anyhow::Error {
    let mut message = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            let _ = writeln!(message, "jq undefined `{name}`: {undef:?} in `{}`", file.code);
        }
    }
    anyhow!(message)
}
