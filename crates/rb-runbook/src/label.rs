// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RUNN_LABEL` expression grammar (§6): labels joined by `or`/`and`/`not`,
//! with `!` as sugar for `not`. Identifiers are lowered through a
//! reversible replacement table so label tokens (which may contain `-`,
//! `/`, `.`, `:`) become valid identifiers.

use crate::ConfigError;

const REPLACEMENTS: &[(&str, &str)] = &[
    ("-", "___hyphen___"),
    ("/", "___slash___"),
    (".", "___dot___"),
    (":", "___colon___"),
];

pub fn lower_label(label: &str) -> String {
    let mut out = label.to_string();
    for (from, to) in REPLACEMENTS {
        out = out.replace(from, to);
    }
    out
}

pub fn raise_label(ident: &str) -> String {
    let mut out = ident.to_string();
    for (from, to) in REPLACEMENTS {
        out = out.replace(to, from);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            _ => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                match ident.as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    "" => {
                        return Err(ConfigError::InvalidLabelExpr(expr.to_string()));
                    }
                    other => tokens.push(Token::Ident(lower_label(other))),
                }
            }
        }
    }
    Ok(tokens)
}

/// Recursive-descent parser/evaluator: `or` binds loosest, then `and`,
/// then `not`, then atoms (identifiers and parenthesized expressions).
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    truthy: &'a dyn Fn(&str) -> bool,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn parse_or(&mut self) -> Result<bool, ConfigError> {
        let mut val = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            let rhs = self.parse_and()?;
            val = val || rhs;
        }
        Ok(val)
    }

    fn parse_and(&mut self) -> Result<bool, ConfigError> {
        let mut val = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            let rhs = self.parse_not()?;
            val = val && rhs;
        }
        Ok(val)
    }

    fn parse_not(&mut self) -> Result<bool, ConfigError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.bump();
            return Ok(!self.parse_not()?);
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<bool, ConfigError> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok((self.truthy)(name)),
            Some(Token::LParen) => {
                let val = self.parse_or()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err(ConfigError::InvalidLabelExpr("unbalanced parens".into())),
                }
            }
            other => Err(ConfigError::InvalidLabelExpr(format!("{other:?}"))),
        }
    }
}

/// Evaluate a label expression against the set of labels present on a
/// runbook. Empty expression -> `true` (§6).
pub fn eval_label_expr(expr: &str, labels: &[String]) -> Result<bool, ConfigError> {
    if expr.trim().is_empty() {
        return Ok(true);
    }
    let present: std::collections::HashSet<String> =
        labels.iter().map(|l| lower_label(l)).collect();
    let tokens = tokenize(expr)?;
    let truthy = move |ident: &str| present.contains(ident);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        truthy: &truthy,
    };
    let result = parser.parse_or()?;
    if parser.pos != tokens.len() {
        return Err(ConfigError::InvalidLabelExpr(expr.to_string()));
    }
    Ok(result)
}

#[cfg(test)]
#[path = "label_tests.rs"]
mod tests;
