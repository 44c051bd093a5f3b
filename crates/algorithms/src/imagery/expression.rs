//! Per-pixel expressions over bound bands and scalars
//!
//! Formulas reference identifiers bound either to a raster or to a scalar:
//!
//! - `"(GREEN - NIR) / (GREEN + NIR)"` → NDWI
//! - `"band - pred + mean"` → detrended value with the mean restored
//! - `"(BLUE > MINI && BLUE < MAXI) ? 1 : 0"` → range test
//!
//! Grammar, lowest precedence first: `?:`, `||`, `&&`, comparisons
//! (`< <= > >= == !=`), `+ -`, `* /`, unary `- + !`, then numbers,
//! identifiers and parentheses. Comparisons and logic produce 1 or 0.
//!
//! A pixel where any referenced band is masked is masked in the output;
//! division by zero is masked as well.

use std::collections::HashMap;

use statgis_core::{Error, Frame, Raster, Result};

use crate::frames::rows_to_vec;
use crate::maybe_rayon::*;

/// Value an identifier in a formula is bound to
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Band(&'a Raster),
    Scalar(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Question,
    Colon,
}

#[derive(Debug, Clone)]
enum Expr {
    Num(f64),
    /// Index into the resolved binding slots
    Var(usize),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

const TWO_CHAR_OPS: [&str; 6] = ["<=", ">=", "==", "!=", "&&", "||"];
const ONE_CHAR_OPS: [&str; 7] = ["+", "-", "*", "/", "<", ">", "!"];

fn tokenize(formula: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            if let Some(op) = TWO_CHAR_OPS.iter().find(|op| **op == pair) {
                tokens.push(Token::Op(*op));
                i += 2;
                continue;
            }
        }
        match c {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '?' => tokens.push(Token::Question),
            ':' => tokens.push(Token::Colon),
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidExpression(format!("invalid number '{text}'")))?;
                tokens.push(Token::Number(value));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                continue;
            }
            c => match ONE_CHAR_OPS.iter().find(|op| op.starts_with(c)) {
                Some(op) => tokens.push(Token::Op(*op)),
                None => {
                    return Err(Error::InvalidExpression(format!(
                        "unexpected character '{c}'"
                    )));
                }
            },
        }
        i += 1;
    }

    Ok(tokens)
}

/// Recursive descent parser; identifiers are resolved to slots as they appear
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    idents: Vec<String>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            idents: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_op(&self, ops: &[&str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => Some(*op),
            _ => None,
        }
    }

    fn parse(mut self) -> Result<(Expr, Vec<String>)> {
        let expr = self.parse_cond()?;
        if let Some(token) = self.peek() {
            return Err(Error::InvalidExpression(format!(
                "unexpected trailing token {token:?}"
            )));
        }
        Ok((expr, self.idents))
    }

    fn parse_cond(&mut self) -> Result<Expr> {
        let cond = self.parse_binary(0)?;
        if self.peek() != Some(&Token::Question) {
            return Ok(cond);
        }
        self.advance();
        let then = self.parse_cond()?;
        match self.advance() {
            Some(Token::Colon) => {}
            _ => return Err(Error::InvalidExpression("expected ':' in conditional".into())),
        }
        let otherwise = self.parse_cond()?;
        Ok(Expr::Cond(Box::new(cond), Box::new(then), Box::new(otherwise)))
    }

    /// Binary levels from loosest to tightest binding
    fn parse_binary(&mut self, level: usize) -> Result<Expr> {
        const LEVELS: [&[&str]; 5] = [
            &["||"],
            &["&&"],
            &["<", "<=", ">", ">=", "==", "!="],
            &["+", "-"],
            &["*", "/"],
        ];
        if level == LEVELS.len() {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek_op(LEVELS[level]) {
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(op) = self.peek_op(&["-", "+", "!"]) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(match op {
                "+" => inner,
                _ => Expr::Unary(op, Box::new(inner)),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => {
                let slot = match self.idents.iter().position(|n| *n == name) {
                    Some(slot) => slot,
                    None => {
                        self.idents.push(name);
                        self.idents.len() - 1
                    }
                };
                Ok(Expr::Var(slot))
            }
            Some(Token::LParen) => {
                let expr = self.parse_cond()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(Error::InvalidExpression("expected closing parenthesis".into())),
                }
            }
            other => Err(Error::InvalidExpression(format!(
                "unexpected token {other:?}"
            ))),
        }
    }
}

fn truthy(v: f64) -> bool {
    v != 0.0
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn eval(expr: &Expr, slots: &[f64]) -> f64 {
    match expr {
        Expr::Num(n) => *n,
        Expr::Var(slot) => slots[*slot],
        Expr::Unary(op, inner) => {
            let v = eval(inner, slots);
            match *op {
                "-" => -v,
                _ => flag(!truthy(v)),
            }
        }
        Expr::Binary(op, left, right) => {
            let l = eval(left, slots);
            let r = eval(right, slots);
            match *op {
                "+" => l + r,
                "-" => l - r,
                "*" => l * r,
                "/" => {
                    if r == 0.0 { f64::NAN } else { l / r }
                }
                "<" => flag(l < r),
                "<=" => flag(l <= r),
                ">" => flag(l > r),
                ">=" => flag(l >= r),
                "==" => flag(l == r),
                "!=" => flag(l != r),
                "&&" => flag(truthy(l) && truthy(r)),
                "||" => flag(truthy(l) || truthy(r)),
                _ => f64::NAN,
            }
        }
        Expr::Cond(cond, then, otherwise) => {
            if truthy(eval(cond, slots)) {
                eval(then, slots)
            } else {
                eval(otherwise, slots)
            }
        }
    }
}

/// Evaluate `formula` at every pixel.
///
/// The output takes the grid of the first band referenced by the formula.
///
/// # Errors
/// - `InvalidExpression` if the formula does not parse or references no band
/// - `InvalidBand` if an identifier has no binding
/// - `SizeMismatch` if referenced bands differ in shape
pub fn expression(formula: &str, bindings: &HashMap<&str, Binding<'_>>) -> Result<Raster> {
    let (expr, idents) = Parser::new(tokenize(formula)?).parse()?;

    let mut resolved = Vec::with_capacity(idents.len());
    for name in &idents {
        match bindings.get(name.as_str()) {
            Some(binding) => resolved.push(*binding),
            None => {
                let mut available: Vec<String> = bindings.keys().map(|k| k.to_string()).collect();
                available.sort();
                return Err(Error::invalid_band(name.clone(), available));
            }
        }
    }

    let template = resolved
        .iter()
        .find_map(|b| match b {
            Binding::Band(r) => Some(*r),
            Binding::Scalar(_) => None,
        })
        .ok_or_else(|| Error::InvalidExpression(format!("'{formula}' references no band")))?;
    for binding in &resolved {
        if let Binding::Band(raster) = binding {
            template.check_same_grid(raster)?;
        }
    }

    let (rows, cols) = template.shape();
    let per_row: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut slots = vec![0.0; resolved.len()];
            let mut row_data = vec![f64::NAN; cols];
            'cells: for (col, cell) in row_data.iter_mut().enumerate() {
                for (slot, binding) in slots.iter_mut().zip(&resolved) {
                    *slot = match binding {
                        Binding::Band(raster) => {
                            let v = unsafe { raster.get_unchecked(row, col) };
                            if v.is_nan() {
                                continue 'cells;
                            }
                            v
                        }
                        Binding::Scalar(v) => *v,
                    };
                }
                *cell = eval(&expr, &slots);
            }
            row_data
        })
        .collect();

    template.with_data(rows_to_vec(per_row))
}

/// Evaluate `formula` with every band of `frame` bound by name, plus scalars
pub fn frame_expression(frame: &Frame, formula: &str, scalars: &[(&str, f64)]) -> Result<Raster> {
    let mut bindings: HashMap<&str, Binding<'_>> = frame
        .bands()
        .iter()
        .map(|b| (b.name.as_str(), Binding::Band(&b.raster)))
        .collect();
    for (name, value) in scalars {
        bindings.insert(name, Binding::Scalar(*value));
    }
    expression(formula, &bindings)
}
