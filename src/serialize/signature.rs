//! Function signature parsing from source text.
//!
//! Two shapes are recognised: conventional functions (named, anonymous,
//! generator, method shorthand, optionally `async`) and arrow functions.
//! Anything else is a hard parse failure.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DescribeError, Result};
use crate::realm::{Realm, Value};

const NATIVE_CODE: &str = "[native code]";

static FUNCTION_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:async\s+)?(?:(function)\s*(\*)?|(\*))?\s*([^(){}=;]*?)\s*\(").unwrap()
});
static LAMBDA_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:async\s+)?([A-Za-z_$][\w$]*)\s*=>").unwrap());
static LAMBDA_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:async\s*)?\(").unwrap());

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSignature {
    /// Empty for anonymous functions and arrows.
    pub name: String,
    /// Raw parameter source, one entry per top-level parameter.
    pub parameters: Vec<String>,
    pub body: String,
    pub is_native: bool,
    pub is_generator: bool,
    pub is_lambda: bool,
    #[serde(skip)]
    source: String,
}

/// Stringifies back to the original source (or a reconstruction of it when
/// the signature was deserialized).
impl fmt::Display for ParsedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.source.is_empty() {
            return f.write_str(&self.source);
        }
        let params = self.parameters.join(", ");
        if self.is_lambda {
            write!(f, "({params}) => {{ {} }}", self.body)
        } else {
            let star = if self.is_generator { "*" } else { "" };
            write!(f, "function{star} {}({params}) {{ {} }}", self.name, self.body)
        }
    }
}

/// Parse the signature of an optional accessor/function value.
///
/// `None` and `undefined` mean "no function present" and yield `Ok(None)`.
/// A non-function is a contract violation; so is unparseable source.
pub fn parse_signature(realm: &Realm, func: Option<&Value>) -> Result<Option<ParsedSignature>> {
    let Some(func) = func.filter(|f| !matches!(f, Value::Undefined)) else {
        return Ok(None);
    };
    let Some(function) = realm.function(func) else {
        return Err(DescribeError::NotAFunction { kind: realm.type_of(func).to_string() });
    };
    parse_source(&function.source).map(Some)
}

pub fn parse_source(source: &str) -> Result<ParsedSignature> {
    let text = source.trim();
    let mut parsed = parse_lambda(text)
        .or_else(|| parse_function(text))
        .ok_or_else(|| DescribeError::UnparseableFunction { text: source.to_string() })?;
    parsed.source = source.to_string();
    Ok(parsed)
}

fn parse_lambda(text: &str) -> Option<ParsedSignature> {
    let (parameters, rest) = if let Some(caps) = LAMBDA_IDENT.captures(text) {
        let end = caps.get(0)?.end();
        (vec![caps[1].to_string()], &text[end..])
    } else {
        let head = LAMBDA_PARENS.find(text)?;
        let open = head.end() - 1;
        let close = matching_paren(text, open)?;
        let rest = text[close + 1..].trim_start().strip_prefix("=>")?;
        (split_parameters(&text[open + 1..close]), rest)
    };
    let body = rest.trim();
    let body = match body.strip_prefix('{').and_then(|b| b.strip_suffix('}')) {
        Some(block) => block.trim(),
        None => body,
    };
    Some(ParsedSignature {
        parameters,
        body: body.to_string(),
        is_native: body.contains(NATIVE_CODE),
        is_lambda: true,
        ..ParsedSignature::default()
    })
}

fn parse_function(text: &str) -> Option<ParsedSignature> {
    let caps = FUNCTION_HEAD.captures(text)?;
    let open = caps.get(0)?.end() - 1;
    let close = matching_paren(text, open)?;
    let block = text[close + 1..].trim_start().strip_prefix('{')?.strip_suffix('}')?;
    let body = block.trim();
    Some(ParsedSignature {
        name: caps[4].trim().to_string(),
        parameters: split_parameters(&text[open + 1..close]),
        body: body.to_string(),
        is_native: body.contains(NATIVE_CODE),
        is_generator: caps.get(2).is_some() || caps.get(3).is_some(),
        is_lambda: false,
        source: String::new(),
    })
}

/// Index of the `)` closing the `(` at `open`, skipping nested brackets and
/// string literals.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate().skip(open) {
        if let Some(q) = quote {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                _ if b == q => quote = None,
                _ => {}
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (b == b')').then_some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a parameter list on top-level commas. An empty list yields no
/// parameters rather than one empty one.
fn split_parameters(list: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut current = String::new();
    for c in list.chars() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            current.push(c);
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(std::mem::take(&mut current).trim().to_string());
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    out.push(current.trim().to_string());
    // trailing comma, or an empty list
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    out
}
