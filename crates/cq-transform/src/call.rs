//! Transform call text
//!
//! A transform line looks like `.name(arg, ..., key=value, ...)`, optionally
//! followed by `as ALIAS` for `get*` commands. The argument list is parsed by
//! a small recursive-descent parser; nothing is ever evaluated.

use crate::error::{TransformError, TransformResult};
use minijinja::Value;
use std::fmt;

/// A literal argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Quoted string
    Str(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
    /// `[a, b, ...]`
    List(Vec<ArgValue>),
    /// Bare identifier, standing for its own text
    Ident(String),
}

impl ArgValue {
    /// Text of a string or identifier value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) | ArgValue::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a template value
    pub fn to_value(&self) -> Value {
        match self {
            ArgValue::Str(s) | ArgValue::Ident(s) => Value::from(s.as_str()),
            ArgValue::Int(i) => Value::from(*i),
            ArgValue::Float(f) => Value::from(*f),
            ArgValue::Bool(b) => Value::from(*b),
            ArgValue::None => Value::from(()),
            ArgValue::List(items) => Value::from(items.iter().map(ArgValue::to_value).collect::<Vec<_>>()),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) | ArgValue::Ident(s) => write!(f, "{s}"),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Float(v) => write!(f, "{v}"),
            ArgValue::Bool(true) => write!(f, "True"),
            ArgValue::Bool(false) => write!(f, "False"),
            ArgValue::None => write!(f, "None"),
            ArgValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// A parsed transform invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TransformCall {
    /// Command name
    pub name: String,
    /// Positional arguments
    pub args: Vec<ArgValue>,
    /// Keyword arguments in source order
    pub kwargs: Vec<(String, ArgValue)>,
}

impl TransformCall {
    /// Parse `name`, `name()` or `name(args...)`
    pub fn parse(text: &str) -> TransformResult<Self> {
        let mut parser = Parser::new(text);
        let call = parser.call()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(call)
    }

    /// Look up a keyword argument
    pub fn kwarg(&self, key: &str) -> Option<&ArgValue> {
        self.kwargs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl fmt::Display for TransformCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        parts.extend(self.kwargs.iter().map(|(k, v)| format!("{k}={v}")));
        write!(f, "{}({})", self.name, parts.join(", "))
    }
}

/// Split a `get* ... as ALIAS` command into the call text and its alias.
///
/// Only commands starting with `get` carry an alias; the split happens at
/// the last ` as `.
pub fn split_alias(command: &str) -> (&str, Option<&str>) {
    if command.starts_with("get") {
        if let Some((call, alias)) = command.rsplit_once(" as ") {
            return (call.trim_end(), Some(alias.trim()));
        }
    }
    (command, None)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self, message: &str) -> TransformError {
        TransformError::Parse {
            text: self.text.to_string(),
            message: format!("{message} at offset {}", self.pos),
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> TransformResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    fn call(&mut self) -> TransformResult<TransformCall> {
        let name = self
            .ident()
            .ok_or_else(|| self.error("expected transform name"))?
            .to_string();
        let mut call = TransformCall {
            name,
            args: Vec::new(),
            kwargs: Vec::new(),
        };
        if !self.eat('(') {
            return Ok(call);
        }
        if self.eat(')') {
            return Ok(call);
        }
        loop {
            self.argument(&mut call)?;
            if self.eat(')') {
                break;
            }
            self.expect(',')?;
            // Trailing comma
            if self.eat(')') {
                break;
            }
        }
        Ok(call)
    }

    fn argument(&mut self, call: &mut TransformCall) -> TransformResult<()> {
        let start = self.pos;
        if let Some(key) = self.ident() {
            self.skip_ws();
            if self.rest().starts_with('=') && !self.rest().starts_with("==") {
                self.pos += 1;
                if call.kwargs.iter().any(|(k, _)| k == key) {
                    return Err(self.error(&format!("keyword '{key}' repeated")));
                }
                let value = self.value()?;
                call.kwargs.push((key.to_string(), value));
                return Ok(());
            }
            self.pos = start;
        }
        if !call.kwargs.is_empty() {
            return Err(self.error("positional argument follows keyword argument"));
        }
        let value = self.value()?;
        call.args.push(value);
        Ok(())
    }

    fn value(&mut self) -> TransformResult<ArgValue> {
        self.skip_ws();
        match self.peek() {
            Some('\'') | Some('"') => self.string(),
            Some('[') => self.list(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            Some(_) => {
                let word = self.ident().ok_or_else(|| self.error("expected a value"))?;
                Ok(match word {
                    "True" | "true" => ArgValue::Bool(true),
                    "False" | "false" => ArgValue::Bool(false),
                    "None" | "none" => ArgValue::None,
                    other => ArgValue::Ident(other.to_string()),
                })
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self) -> TransformResult<ArgValue> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected a string"));
        };
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.pos += i + 1;
                    return Ok(ArgValue::Str(out));
                }
                c => out.push(c),
            }
        }
        self.pos = self.text.len();
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> TransformResult<ArgValue> {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(i, c)| {
                !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || (*i == 0 && (*c == '-' || *c == '+')))
                    && !((*c == '-' || *c == '+') && rest[..*i].ends_with(['e', 'E']))
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let literal = rest[..end].replace('_', "");
        let value = if let Ok(i) = literal.parse::<i64>() {
            ArgValue::Int(i)
        } else if let Ok(f) = literal.parse::<f64>() {
            if literal.chars().any(|c| c.is_ascii_digit()) {
                ArgValue::Float(f)
            } else {
                return Err(self.error(&format!("invalid number '{}'", &rest[..end])));
            }
        } else {
            return Err(self.error(&format!("invalid number '{}'", &rest[..end])));
        };
        self.pos += end;
        Ok(value)
    }

    fn list(&mut self) -> TransformResult<ArgValue> {
        self.expect('[')?;
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(ArgValue::List(items));
        }
        loop {
            items.push(self.value()?);
            if self.eat(']') {
                break;
            }
            self.expect(',')?;
            if self.eat(']') {
                break;
            }
        }
        Ok(ArgValue::List(items))
    }
}

#[cfg(test)]
#[path = "call_test.rs"]
mod tests;
