// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The built-in `Evaluator`: dotted-path lookups over the store snapshot
//! plus a small comparison/boolean grammar (§6). Deliberately minimal —
//! a richer expression language is out of scope.

use rb_core::StoreValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("expression parse error in `{expr}`: {message}")]
    Parse { expr: String, message: String },
    #[error("expression `{0}` did not evaluate to a number")]
    NotANumber(String),
}

/// The result of `eval_with_trace`: a boolean outcome plus a
/// human-readable breakdown of how it was reached.
pub struct EvalTrace {
    result: bool,
    trace: String,
}

impl EvalTrace {
    pub fn output_as_bool(&self) -> bool {
        self.result
    }

    pub fn format_trace_tree(&self) -> String {
        self.trace.clone()
    }
}

pub trait Evaluator: Send + Sync {
    fn eval_cond(&self, expr: &str, env: &StoreValue) -> Result<bool, EvalError>;
    fn eval_count(&self, expr: &str, env: &StoreValue) -> Result<i64, EvalError>;
    fn eval_expand(&self, input: &StoreValue, env: &StoreValue) -> StoreValue;
    fn eval_with_trace(&self, expr: &str, env: &StoreValue) -> Result<EvalTrace, EvalError>;
}

/// Dotted-path + comparison expression evaluator.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinEvaluator;

impl Evaluator for BuiltinEvaluator {
    fn eval_cond(&self, expr: &str, env: &StoreValue) -> Result<bool, EvalError> {
        let value = eval_expr(expr, env)?;
        Ok(value.is_truthy())
    }

    fn eval_count(&self, expr: &str, env: &StoreValue) -> Result<i64, EvalError> {
        let value = eval_expr(expr, env)?;
        value
            .as_i64()
            .ok_or_else(|| EvalError::NotANumber(expr.to_string()))
    }

    fn eval_expand(&self, input: &StoreValue, env: &StoreValue) -> StoreValue {
        expand(input, env)
    }

    fn eval_with_trace(&self, expr: &str, env: &StoreValue) -> Result<EvalTrace, EvalError> {
        let value = eval_expr(expr, env)?;
        let result = value.is_truthy();
        let trace = format!("{expr} => {value} => {result}");
        Ok(EvalTrace { result, trace })
    }
}

fn expand(input: &StoreValue, env: &StoreValue) -> StoreValue {
    match input {
        StoreValue::String(s) => expand_string(s, env),
        StoreValue::Sequence(items) => {
            StoreValue::Sequence(items.iter().map(|v| expand(v, env)).collect())
        }
        StoreValue::Mapping(map) => StoreValue::Mapping(
            map.iter()
                .map(|(k, v)| (k.clone(), expand(v, env)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// A string that is *exactly* one `{{ expr }}` template expands to the
/// typed value; a string with embedded templates expands by
/// string-substitution.
fn expand_string(s: &str, env: &StoreValue) -> StoreValue {
    let trimmed = s.trim();
    if let Some(inner) = whole_template(trimmed) {
        return eval_expr(inner, env).unwrap_or(StoreValue::Null);
    }

    let mut out = String::new();
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        if let Some(end) = after.find("}}") {
            let inner = after[..end].trim();
            let value = eval_expr(inner, env).unwrap_or(StoreValue::Null);
            out.push_str(&value.to_string());
            rest = &after[end + 2..];
        } else {
            out.push_str("{{");
            rest = after;
        }
    }
    out.push_str(rest);
    StoreValue::String(out)
}

fn whole_template(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn eval_expr(expr: &str, env: &StoreValue) -> Result<StoreValue, EvalError> {
    let tokens = tokenize(expr).map_err(|message| EvalError::Parse {
        expr: expr.to_string(),
        message,
    })?;
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        env,
    };
    let value = parser.parse_or().map_err(|message| EvalError::Parse {
        expr: expr.to_string(),
        message,
    })?;
    if parser.pos != tokens.len() {
        return Err(EvalError::Parse {
            expr: expr.to_string(),
            message: "trailing tokens".to_string(),
        });
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Number(f64),
    Str(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    s.push(chars[i]);
                    i += 1;
                }
                i += 1;
                tokens.push(Tok::Str(s));
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Tok::Op("=="));
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Tok::Op("!="));
                i += 2;
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Tok::Op(">="));
                i += 2;
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Tok::Op("<="));
                i += 2;
            }
            '>' => {
                tokens.push(Tok::Op(">"));
                i += 1;
            }
            '<' => {
                tokens.push(Tok::Op("<"));
                i += 1;
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Tok::Op("&&"));
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Tok::Op("||"));
                i += 2;
            }
            '!' => {
                tokens.push(Tok::Op("!"));
                i += 1;
            }
            c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n: f64 = text
                    .parse()
                    .map_err(|_| format!("invalid number literal `{text}`"))?;
                tokens.push(Tok::Number(n));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' || c == '[' || c == ']' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric()
                        || chars[i] == '_'
                        || chars[i] == '.'
                        || chars[i] == '['
                        || chars[i] == ']')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                match text.as_str() {
                    "and" => tokens.push(Tok::Op("&&")),
                    "or" => tokens.push(Tok::Op("||")),
                    "not" => tokens.push(Tok::Op("!")),
                    "true" => tokens.push(Tok::Ident("true".to_string())),
                    "false" => tokens.push(Tok::Ident("false".to_string())),
                    _ => tokens.push(Tok::Ident(text)),
                }
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    env: &'a StoreValue,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Tok> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn parse_or(&mut self) -> Result<StoreValue, String> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Tok::Op("||"))) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = StoreValue::Bool(lhs.is_truthy() || rhs.is_truthy());
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<StoreValue, String> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek(), Some(Tok::Op("&&"))) {
            self.bump();
            let rhs = self.parse_not()?;
            lhs = StoreValue::Bool(lhs.is_truthy() && rhs.is_truthy());
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<StoreValue, String> {
        if matches!(self.peek(), Some(Tok::Op("!"))) {
            self.bump();
            let v = self.parse_not()?;
            return Ok(StoreValue::Bool(!v.is_truthy()));
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<StoreValue, String> {
        let lhs = self.parse_atom()?;
        if let Some(Tok::Op(op @ ("==" | "!=" | ">" | ">=" | "<" | "<="))) = self.peek().cloned() {
            self.bump();
            let rhs = self.parse_atom()?;
            return Ok(StoreValue::Bool(compare(&lhs, op, &rhs)));
        }
        Ok(lhs)
    }

    fn parse_atom(&mut self) -> Result<StoreValue, String> {
        match self.bump().cloned() {
            Some(Tok::Number(n)) => Ok(number_value(n)),
            Some(Tok::Str(s)) => Ok(StoreValue::String(s)),
            Some(Tok::Ident(ref i)) if i == "true" => Ok(StoreValue::Bool(true)),
            Some(Tok::Ident(ref i)) if i == "false" => Ok(StoreValue::Bool(false)),
            Some(Tok::Ident(path)) => Ok(self.env.get_path(&path).cloned().unwrap_or(StoreValue::Null)),
            Some(Tok::LParen) => {
                let v = self.parse_or()?;
                match self.bump() {
                    Some(Tok::RParen) => Ok(v),
                    _ => Err("expected closing paren".to_string()),
                }
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

fn number_value(n: f64) -> StoreValue {
    if n.fract() == 0.0 {
        StoreValue::from(n as i64)
    } else {
        StoreValue::Number(
            serde_json::Number::from_f64(n).unwrap_or_else(|| serde_json::Number::from(0)),
        )
    }
}

fn compare(lhs: &StoreValue, op: &str, rhs: &StoreValue) -> bool {
    match op {
        "==" => values_equal(lhs, rhs),
        "!=" => !values_equal(lhs, rhs),
        _ => match (numeric(lhs), numeric(rhs)) {
            (Some(a), Some(b)) => match op {
                ">" => a > b,
                ">=" => a >= b,
                "<" => a < b,
                "<=" => a <= b,
                _ => false,
            },
            _ => false,
        },
    }
}

fn values_equal(a: &StoreValue, b: &StoreValue) -> bool {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.to_json() == b.to_json(),
    }
}

fn numeric(v: &StoreValue) -> Option<f64> {
    match v {
        StoreValue::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
