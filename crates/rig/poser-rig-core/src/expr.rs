//! Scripted driver expressions.
//!
//! Drivers carry a small arithmetic language: numbers, variable names,
//! `+ - * /`, unary minus, parentheses and calls to a fixed set of
//! functions (`min`, `max`, `abs`, `degrees`, `radians`, `clamp`).
//! Nothing else is accepted, so an expression can always be evaluated
//! without touching the document.

use crate::error::RigError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f32),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

fn tokenize(src: &str) -> Result<Vec<Token>, RigError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(tok) = single {
            tokens.push(tok);
            pos += 1;
            continue;
        }
        if c.is_whitespace() {
            pos += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            // exponent: 1e-05
            if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
                let mut look = pos + 1;
                if look < chars.len() && (chars[look] == '-' || chars[look] == '+') {
                    look += 1;
                }
                if look < chars.len() && chars[look].is_ascii_digit() {
                    pos = look;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
            }
            let text: String = chars[start..pos].iter().collect();
            let n = text
                .parse::<f32>()
                .map_err(|e| RigError::Expression(format!("bad number '{text}': {e}")))?;
            tokens.push(Token::Number(n));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
        } else {
            return Err(RigError::Expression(format!(
                "unexpected character '{c}' at {pos}"
            )));
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }
}

/// Parsed driver expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f32),
    Var(String),
    Neg(Box<Expr>),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn expression(&mut self, min_precedence: u8) -> Result<Expr, RigError> {
        let mut left = self.unary()?;
        while let Some(op) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.current += 1;
            let right = self.expression(precedence + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, RigError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, RigError> {
        match self.tokens.get(self.current).cloned() {
            Some(Token::Number(n)) => {
                self.current += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::Ident(name)) => {
                self.current += 1;
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    Ok(Expr::Call { func: name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                self.current += 1;
                let inner = self.expression(1)?;
                self.expect(&Token::RParen, "')' after expression")?;
                Ok(inner)
            }
            Some(other) => Err(RigError::Expression(format!("unexpected token {other:?}"))),
            None => Err(RigError::Expression("unexpected end of expression".into())),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, RigError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression(1)?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen, "')' after arguments")?;
        Ok(args)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        match self.tokens.get(self.current)? {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            _ => None,
        }
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.tokens.get(self.current) == Some(tok) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Token, what: &str) -> Result<(), RigError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(RigError::Expression(format!(
                "expected {what}, found {:?}",
                self.tokens.get(self.current)
            )))
        }
    }
}

fn arity_error(func: &str, expected: &str, got: usize) -> RigError {
    RigError::Expression(format!("{func}() takes {expected} argument(s), got {got}"))
}

impl Expr {
    pub fn parse(src: &str) -> Result<Expr, RigError> {
        let tokens = tokenize(src)?;
        if tokens.is_empty() {
            return Err(RigError::Expression("empty expression".into()));
        }
        let mut parser = Parser { tokens, current: 0 };
        let expr = parser.expression(1)?;
        if let Some(extra) = parser.tokens.get(parser.current) {
            return Err(RigError::Expression(format!(
                "unexpected trailing token {extra:?}"
            )));
        }
        Ok(expr)
    }

    /// Evaluate with `lookup` supplying variable values.
    pub fn eval<F>(&self, lookup: &F) -> Result<f32, RigError>
    where
        F: Fn(&str) -> Option<f32>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Var(name) => lookup(name)
                .ok_or_else(|| RigError::Expression(format!("unknown variable '{name}'"))),
            Expr::Neg(inner) => Ok(-inner.eval(lookup)?),
            Expr::Binary { left, op, right } => {
                let l = left.eval(lookup)?;
                let r = right.eval(lookup)?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div if r == 0.0 => {
                        Err(RigError::Expression("division by zero".into()))
                    }
                    BinaryOp::Div => Ok(l / r),
                }
            }
            Expr::Call { func, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(lookup))
                    .collect::<Result<Vec<f32>, RigError>>()?;
                call(func, &values)
            }
        }
    }

    /// Variable names referenced, in first-use order.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Neg(inner) => inner.collect_vars(out),
            Expr::Binary { left, right, .. } => {
                left.collect_vars(out);
                right.collect_vars(out);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_vars(out)),
        }
    }
}

fn call(func: &str, v: &[f32]) -> Result<f32, RigError> {
    match func {
        "min" | "max" => {
            let first = *v.first().ok_or_else(|| arity_error(func, "at least 1", 0))?;
            let fold = if func == "min" { f32::min } else { f32::max };
            Ok(v[1..].iter().copied().fold(first, fold))
        }
        "abs" | "degrees" | "radians" => match v {
            [x] => Ok(match func {
                "abs" => x.abs(),
                "degrees" => x.to_degrees(),
                _ => x.to_radians(),
            }),
            _ => Err(arity_error(func, "1", v.len())),
        },
        "clamp" => match v {
            [x] => Ok(x.clamp(0.0, 1.0)),
            [x, lo, hi] => Ok(x.max(*lo).min(*hi)),
            _ => Err(arity_error(func, "1 or 3", v.len())),
        },
        other => Err(RigError::Expression(format!("unknown function '{other}'"))),
    }
}
