// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Expression language shared by directives and macro tokens.
//!
//! The grammar is deliberately small: numbers, strings, booleans, identifier
//! lookup and assignment, arithmetic, comparisons, short-circuit logic, the
//! ternary operator and a handful of numeric builtins. Statements may be
//! chained with `,` or `;`; the value of a chain is the value of its last
//! statement.

use std::cmp::Ordering;
use std::fmt;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Zero, NaN, the empty string and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0 && !v.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }

    /// Integer view of the value; floats qualify when they have no fraction.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                if *v >= i64::MIN as f64 && *v <= i64::MAX as f64 {
                    Some(*v as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => {
                if v.is_nan() {
                    write!(f, "NaN")
                } else if v.is_infinite() {
                    write!(f, "{}Infinity", if *v < 0.0 { "-" } else { "" })
                } else if *v == 0.0 {
                    write!(f, "0")
                } else {
                    write!(f, "{v}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Error returned from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
    pub offset: Option<usize>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Symbol storage consulted and updated during evaluation.
pub trait EvalContext {
    /// Look up a binding by name.
    fn lookup_symbol(&self, name: &str) -> Option<Value>;

    /// Create or overwrite a binding.
    fn assign_symbol(&mut self, name: &str, value: Value);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    LogicNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicAnd,
    LogicOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl AssignOp {
    fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Subtract => Some(BinaryOp::Subtract),
            AssignOp::Multiply => Some(BinaryOp::Multiply),
            AssignOp::Divide => Some(BinaryOp::Divide),
        }
    }
}

/// Parsed expression tree. Offsets are byte positions in the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value, usize),
    Identifier(String, usize),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        offset: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        offset: usize,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Assign {
        name: String,
        op: AssignOp,
        value: Box<Expr>,
        offset: usize,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        offset: usize,
    },
    Sequence(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(Value),
    Str(String),
    Ident(String),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "+", "-", "*", "/",
    "%", "<", ">", "!", "=", "?", ":", "(", ")", ",", ";",
];

fn tokenize(src: &str) -> Result<Vec<Token>, EvalError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            let (value, end) = scan_number(src, pos)?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset: start,
            });
            pos = end;
            continue;
        }

        if c == b'"' || c == b'\'' {
            let (text, end) = scan_string(src, pos)?;
            tokens.push(Token {
                kind: TokenKind::Str(text),
                offset: start,
            });
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            let word = &src[start..pos];
            let kind = match word {
                "true" => TokenKind::Number(Value::Bool(true)),
                "false" => TokenKind::Number(Value::Bool(false)),
                _ => TokenKind::Ident(word.to_string()),
            };
            tokens.push(Token {
                kind,
                offset: start,
            });
            continue;
        }

        let rest = &src[pos..];
        match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            Some(punct) => {
                tokens.push(Token {
                    kind: TokenKind::Punct(*punct),
                    offset: start,
                });
                pos += punct.len();
            }
            None => {
                let ch = rest.chars().next().unwrap_or('?');
                return Err(EvalError::at(format!("Unexpected character '{ch}'"), start));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: src.len(),
    });
    Ok(tokens)
}

fn scan_number(src: &str, start: usize) -> Result<(Value, usize), EvalError> {
    let bytes = src.as_bytes();
    let mut pos = start;

    if bytes[pos] == b'0' && matches!(bytes.get(pos + 1), Some(b'x') | Some(b'X')) {
        pos += 2;
        while pos < bytes.len() && bytes[pos].is_ascii_hexdigit() {
            pos += 1;
        }
        let digits = &src[start + 2..pos];
        return i64::from_str_radix(digits, 16)
            .map(|v| (Value::Int(v), pos))
            .map_err(|_| EvalError::at(format!("Invalid number: {}", &src[start..pos]), start));
    }

    let mut is_float = false;
    while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
        if bytes[pos] == b'.' {
            is_float = true;
        }
        pos += 1;
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut probe = pos + 1;
        if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            is_float = true;
            pos = probe;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text = &src[start..pos];
    let value = if is_float {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>()
            .ok()
            .map(Value::Int)
            .or_else(|| text.parse::<f64>().ok().map(Value::Float))
    };
    value
        .map(|v| (v, pos))
        .ok_or_else(|| EvalError::at(format!("Invalid number: {text}"), start))
}

fn scan_string(src: &str, start: usize) -> Result<(String, usize), EvalError> {
    let mut chars = src[start..].char_indices();
    let (_, quote) = chars
        .next()
        .ok_or_else(|| EvalError::at("Unterminated string", start))?;
    let mut out = String::new();
    while let Some((idx, ch)) = chars.next() {
        if ch == quote {
            return Ok((out, start + idx + ch.len_utf8()));
        }
        if ch == '\\' {
            let Some((_, escaped)) = chars.next() else {
                break;
            };
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
        } else {
            out.push(ch);
        }
    }
    Err(EvalError::at("Unterminated string", start))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_punct(&self) -> Option<&'static str> {
        match self.peek().kind {
            TokenKind::Punct(p) => Some(p),
            _ => None,
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek_punct() == Some(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), EvalError> {
        if self.eat(punct) {
            Ok(())
        } else {
            let tok = self.peek();
            Err(EvalError::at(
                format!("Expected '{punct}' but found {}", describe(&tok.kind)),
                tok.offset,
            ))
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EvalError::at(
                format!("Expression nesting exceeds {}", self.max_depth),
                self.peek().offset,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_sequence(&mut self) -> Result<Expr, EvalError> {
        let mut items = Vec::new();
        loop {
            while self.eat(";") {}
            if matches!(self.peek().kind, TokenKind::Eof) {
                break;
            }
            items.push(self.parse_assignment()?);
            if !(self.eat(",") || self.eat(";")) {
                break;
            }
        }
        let tok = self.peek();
        if !matches!(tok.kind, TokenKind::Eof) {
            return Err(EvalError::at(
                format!("Unexpected {}", describe(&tok.kind)),
                tok.offset,
            ));
        }
        match items.len() {
            0 => Err(EvalError::new("Empty expression")),
            1 => Ok(items.remove(0)),
            _ => Ok(Expr::Sequence(items)),
        }
    }

    fn parse_assignment(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, EvalError> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let op = match self.tokens.get(self.pos + 1).map(|t| &t.kind) {
                Some(TokenKind::Punct("=")) => Some(AssignOp::Assign),
                Some(TokenKind::Punct("+=")) => Some(AssignOp::Add),
                Some(TokenKind::Punct("-=")) => Some(AssignOp::Subtract),
                Some(TokenKind::Punct("*=")) => Some(AssignOp::Multiply),
                Some(TokenKind::Punct("/=")) => Some(AssignOp::Divide),
                _ => None,
            };
            if let Some(op) = op {
                let name = name.clone();
                let offset = self.peek().offset;
                self.advance();
                self.advance();
                let value = self.parse_assignment()?;
                return Ok(Expr::Assign {
                    name,
                    op,
                    value: Box::new(value),
                    offset,
                });
            }
        }
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, EvalError> {
        let cond = self.parse_binary(0)?;
        if !self.eat("?") {
            return Ok(cond);
        }
        let then_expr = self.parse_assignment()?;
        self.expect(":")?;
        let else_expr = self.parse_assignment()?;
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, EvalError> {
        const LEVELS: &[&[(&str, BinaryOp)]] = &[
            &[("||", BinaryOp::LogicOr)],
            &[("&&", BinaryOp::LogicAnd)],
            &[
                ("===", BinaryOp::Eq),
                ("!==", BinaryOp::Ne),
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::Ne),
            ],
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Subtract)],
            &[
                ("*", BinaryOp::Multiply),
                ("/", BinaryOp::Divide),
                ("%", BinaryOp::Mod),
            ],
        ];

        if level >= LEVELS.len() {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        loop {
            let Some(punct) = self.peek_punct() else {
                break;
            };
            let Some((_, op)) = LEVELS[level].iter().find(|(p, _)| *p == punct) else {
                break;
            };
            let offset = self.advance().offset;
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary {
                op: *op,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek_punct() {
            Some("-") => Some(UnaryOp::Minus),
            Some("+") => Some(UnaryOp::Plus),
            Some("!") => Some(UnaryOp::LogicNot),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_primary();
        };
        let offset = self.advance().offset;
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            expr: Box::new(operand?),
            offset,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Number(value) => Ok(Expr::Literal(value, tok.offset)),
            TokenKind::Str(text) => Ok(Expr::Literal(Value::Str(text), tok.offset)),
            TokenKind::Ident(name) => {
                if !self.eat("(") {
                    return Ok(Expr::Identifier(name, tok.offset));
                }
                let mut args = Vec::new();
                if !self.eat(")") {
                    loop {
                        args.push(self.parse_assignment()?);
                        if self.eat(")") {
                            break;
                        }
                        self.expect(",")?;
                    }
                }
                Ok(Expr::Call {
                    name,
                    args,
                    offset: tok.offset,
                })
            }
            TokenKind::Punct("(") => {
                let inner = self.parse_assignment()?;
                self.expect(")")?;
                Ok(inner)
            }
            other => Err(EvalError::at(
                format!("Unexpected {}", describe(&other)),
                tok.offset,
            )),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(v) => format!("value '{v}'"),
        TokenKind::Str(s) => format!("string \"{s}\""),
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Punct(p) => format!("'{p}'"),
        TokenKind::Eof => "end of expression".to_string(),
    }
}

/// Parse expression source into a tree, bounding nesting at `max_depth`.
pub fn parse_expression(src: &str, max_depth: usize) -> Result<Expr, EvalError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    parser.parse_sequence()
}

/// Parse and evaluate `src` against `ctx`.
pub fn evaluate(
    src: &str,
    ctx: &mut dyn EvalContext,
    max_depth: usize,
) -> Result<Value, EvalError> {
    let expr = parse_expression(src, max_depth)?;
    eval_expr(&expr, ctx)
}

/// Evaluate a parsed expression.
pub fn eval_expr(expr: &Expr, ctx: &mut dyn EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value, _) => Ok(value.clone()),

        Expr::Identifier(name, offset) => ctx
            .lookup_symbol(name)
            .ok_or_else(|| EvalError::at(format!("{name} is not defined"), *offset)),

        Expr::Unary { op, expr, offset } => {
            let val = eval_expr(expr, ctx)?;
            apply_unary(*op, val, *offset)
        }

        Expr::Binary {
            op: BinaryOp::LogicAnd,
            left,
            right,
            ..
        } => {
            let l = eval_expr(left, ctx)?;
            if l.is_truthy() {
                eval_expr(right, ctx)
            } else {
                Ok(l)
            }
        }

        Expr::Binary {
            op: BinaryOp::LogicOr,
            left,
            right,
            ..
        } => {
            let l = eval_expr(left, ctx)?;
            if l.is_truthy() {
                Ok(l)
            } else {
                eval_expr(right, ctx)
            }
        }

        Expr::Binary {
            op,
            left,
            right,
            offset,
        } => {
            let l = eval_expr(left, ctx)?;
            let r = eval_expr(right, ctx)?;
            apply_binary(*op, l, r, *offset)
        }

        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            if eval_expr(cond, ctx)?.is_truthy() {
                eval_expr(then_expr, ctx)
            } else {
                eval_expr(else_expr, ctx)
            }
        }

        Expr::Assign {
            name,
            op,
            value,
            offset,
        } => {
            let rhs = eval_expr(value, ctx)?;
            let result = match op.binary() {
                None => rhs,
                Some(bin) => {
                    let current = ctx
                        .lookup_symbol(name)
                        .ok_or_else(|| EvalError::at(format!("{name} is not defined"), *offset))?;
                    apply_binary(bin, current, rhs, *offset)?
                }
            };
            ctx.assign_symbol(name, result.clone());
            Ok(result)
        }

        Expr::Call { name, args, offset } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, ctx)?);
            }
            call_builtin(name, &values, *offset)
        }

        Expr::Sequence(items) => {
            let mut last = None;
            for item in items {
                last = Some(eval_expr(item, ctx)?);
            }
            last.ok_or_else(|| EvalError::new("Empty expression"))
        }
    }
}

fn expect_number(value: &Value, offset: usize) -> Result<f64, EvalError> {
    value.as_f64().ok_or_else(|| {
        EvalError::at(
            format!("Expected a number but found {} '{value}'", value.kind_name()),
            offset,
        )
    })
}

/// Convert a float result back to an integer when it is exactly representable.
fn normalize(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        Value::Int(value as i64)
    } else {
        Value::Float(value)
    }
}

/// Apply a unary operator to a value.
pub fn apply_unary(op: UnaryOp, val: Value, offset: usize) -> Result<Value, EvalError> {
    match op {
        UnaryOp::LogicNot => Ok(Value::Bool(!val.is_truthy())),
        UnaryOp::Plus => {
            expect_number(&val, offset)?;
            Ok(val)
        }
        UnaryOp::Minus => match val {
            Value::Int(v) => Ok(v
                .checked_neg()
                .map(Value::Int)
                .unwrap_or(Value::Float(-(v as f64)))),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(EvalError::at(
                format!("Cannot negate {} '{other}'", other.kind_name()),
                offset,
            )),
        },
    }
}

/// Apply a binary operator to two values.
pub fn apply_binary(op: BinaryOp, l: Value, r: Value, offset: usize) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => {
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                return Ok(Value::Str(format!("{l}{r}")));
            }
            arithmetic(l, r, offset, i64::checked_add, |a, b| a + b)
        }
        BinaryOp::Subtract => arithmetic(l, r, offset, i64::checked_sub, |a, b| a - b),
        BinaryOp::Multiply => arithmetic(l, r, offset, i64::checked_mul, |a, b| a * b),
        BinaryOp::Divide => {
            let divisor = expect_number(&r, offset)?;
            let dividend = expect_number(&l, offset)?;
            if divisor == 0.0 {
                return Err(EvalError::at("Division by zero", offset));
            }
            if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
                if a.checked_rem(*b) == Some(0) {
                    if let Some(q) = a.checked_div(*b) {
                        return Ok(Value::Int(q));
                    }
                }
            }
            Ok(Value::Float(dividend / divisor))
        }
        BinaryOp::Mod => {
            let divisor = expect_number(&r, offset)?;
            let dividend = expect_number(&l, offset)?;
            if divisor == 0.0 {
                return Err(EvalError::at("Modulo by zero", offset));
            }
            if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
                if let Some(rem) = a.checked_rem(*b) {
                    return Ok(Value::Int(rem));
                }
            }
            Ok(Value::Float(dividend % divisor))
        }
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare_values(&l, &r, offset)?;
            let result = match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
                (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
                (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::LogicAnd => Ok(if l.is_truthy() { r } else { l }),
        BinaryOp::LogicOr => Ok(if l.is_truthy() { l } else { r }),
    }
}

fn arithmetic(
    l: Value,
    r: Value,
    offset: usize,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
        if let Some(v) = int_op(*a, *b) {
            return Ok(Value::Int(v));
        }
    }
    let a = expect_number(&l, offset)?;
    let b = expect_number(&r, offset)?;
    Ok(Value::Float(float_op(a, b)))
}

/// Equality used by `==` and by switch comparisons: numbers compare across
/// integer/float, everything else compares within its own kind.
pub fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn compare_values(l: &Value, r: &Value, offset: usize) -> Result<Option<Ordering>, EvalError> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        _ => {
            let a = expect_number(l, offset)?;
            let b = expect_number(r, offset)?;
            Ok(a.partial_cmp(&b))
        }
    }
}

fn call_builtin(name: &str, args: &[Value], offset: usize) -> Result<Value, EvalError> {
    let unary = |f: fn(f64) -> f64| -> Result<Value, EvalError> {
        if args.len() != 1 {
            return Err(EvalError::at(
                format!("{name}() expects 1 argument, got {}", args.len()),
                offset,
            ));
        }
        if let Value::Int(v) = args[0] {
            if name != "sqrt" {
                return Ok(Value::Int(if name == "abs" { v.wrapping_abs() } else { v }));
            }
        }
        Ok(normalize(f(expect_number(&args[0], offset)?)))
    };

    match name {
        "abs" => unary(f64::abs),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(|v| (v + 0.5).floor()),
        "sqrt" => {
            if args.len() != 1 {
                return Err(EvalError::at(
                    format!("sqrt() expects 1 argument, got {}", args.len()),
                    offset,
                ));
            }
            Ok(Value::Float(expect_number(&args[0], offset)?.sqrt()))
        }
        "min" | "max" => {
            let mut best: Option<&Value> = None;
            for arg in args {
                let candidate = expect_number(arg, offset)?;
                best = match best {
                    None => Some(arg),
                    Some(current) => {
                        let current_num = expect_number(current, offset)?;
                        let better = if name == "min" {
                            candidate < current_num
                        } else {
                            candidate > current_num
                        };
                        Some(if better { arg } else { current })
                    }
                };
            }
            best.cloned()
                .ok_or_else(|| EvalError::at(format!("{name}() expects at least 1 argument"), offset))
        }
        _ => Err(EvalError::at(format!("{name} is not a function"), offset)),
    }
}
