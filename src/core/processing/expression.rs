//! Band expression evaluation: a comma-separated list of arithmetic
//! expressions over named bands, evaluated element-wise against the
//! composite's pixel data.
//!
//! The grammar covers the usual band-math vocabulary: `+ - * /`, unary
//! minus, parentheses, numeric literals, and comparisons (`< <= > >= ==
//! !=`) yielding 1.0/0.0. Non-finite results (division by zero, 0/0) are
//! sanitized to 0 so they cannot corrupt downstream rendering.
use ndarray::{Array2, Array3, ArrayView2};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mosaic::CompositeImage;

/// Number of output bands an RGB expression must produce.
pub const RGB_BAND_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone)]
enum Expr {
    Num(f64),
    Band(usize),
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, bands: &[ArrayView2<'_, f64>], row: usize, col: usize) -> f64 {
        match self {
            Expr::Num(v) => *v,
            Expr::Band(idx) => bands[*idx][[row, col]],
            Expr::Neg(inner) => -inner.eval(bands, row, col),
            Expr::Bin(op, lhs, rhs) => {
                let a = lhs.eval(bands, row, col);
                let b = rhs.eval(bands, row, col);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Lt => (a < b) as u8 as f64,
                    BinOp::Le => (a <= b) as u8 as f64,
                    BinOp::Gt => (a > b) as u8 as f64,
                    BinOp::Ge => (a >= b) as u8 as f64,
                    BinOp::Eq => (a == b) as u8 as f64,
                    BinOp::Ne => (a != b) as u8 as f64,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '=' => {
                chars.next();
                if chars.next() == Some('=') {
                    tokens.push(Token::EqEq);
                } else {
                    return Err(Error::Expression {
                        reason: "single '=' is not an operator, use '=='".to_string(),
                    });
                }
            }
            '!' => {
                chars.next();
                if chars.next() == Some('=') {
                    tokens.push(Token::Ne);
                } else {
                    return Err(Error::Expression {
                        reason: "single '!' is not an operator, use '!='".to_string(),
                    });
                }
            }
            '0'..='9' | '.' => {
                let mut lit = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        lit.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = lit.parse::<f64>().map_err(|_| Error::Expression {
                    reason: format!("malformed number literal: {lit}"),
                })?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(Error::Expression {
                    reason: format!("unexpected character in expression: {other:?}"),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    band_names: &'a [String],
}

impl<'a> Parser<'a> {
    fn parse(input: &str, band_names: &'a [String]) -> Result<Expr> {
        let mut parser = Parser {
            tokens: tokenize(input)?,
            pos: 0,
            band_names,
        };
        if parser.tokens.is_empty() {
            return Err(Error::Expression {
                reason: "empty expression".to_string(),
            });
        }
        let expr = parser.comparison()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::Expression {
                reason: format!("trailing input after expression: {:?}", parser.tokens[parser.pos]),
            });
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut lhs = self.additive()?;
        while let Some(op) = match self.peek() {
            Some(Token::Lt) => Some(BinOp::Lt),
            Some(Token::Le) => Some(BinOp::Le),
            Some(Token::Gt) => Some(BinOp::Gt),
            Some(Token::Ge) => Some(BinOp::Ge),
            Some(Token::EqEq) => Some(BinOp::Eq),
            Some(Token::Ne) => Some(BinOp::Ne),
            _ => None,
        } {
            self.advance();
            let rhs = self.additive()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::Minus) {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.peek() == Some(&Token::Plus) {
            self.advance();
            return self.unary();
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::Ident(name)) => {
                let idx = self
                    .band_names
                    .iter()
                    .position(|b| *b == name)
                    .ok_or_else(|| Error::Expression {
                        reason: format!(
                            "unknown band reference '{name}', available: {}",
                            self.band_names.join(", ")
                        ),
                    })?;
                Ok(Expr::Band(idx))
            }
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(Error::Expression {
                        reason: "unbalanced parentheses".to_string(),
                    }),
                }
            }
            other => Err(Error::Expression {
                reason: format!("expected value, found {other:?}"),
            }),
        }
    }
}

/// Evaluate an RGB expression against a composite whose bands are bound to
/// `band_names` in order. Returns a new composite with exactly three bands
/// (expression order) and the original validity mask unchanged.
pub fn evaluate_rgb_expression(
    image: &CompositeImage,
    band_names: &[String],
    expression: &str,
) -> Result<CompositeImage> {
    if band_names.len() > image.band_count() {
        return Err(Error::Expression {
            reason: format!(
                "{} band names bound against {} composite bands",
                band_names.len(),
                image.band_count()
            ),
        });
    }

    let parts: Vec<&str> = expression.split(',').map(str::trim).collect();
    if parts.len() != RGB_BAND_COUNT {
        return Err(Error::Expression {
            reason: format!(
                "RGB expression must produce exactly {RGB_BAND_COUNT} bands, got {}",
                parts.len()
            ),
        });
    }

    let parsed: Vec<Expr> = parts
        .iter()
        .map(|part| Parser::parse(part, band_names))
        .collect::<Result<_>>()?;

    let bands: Vec<ArrayView2<'_, f64>> = (0..band_names.len())
        .map(|b| image.data.index_axis(ndarray::Axis(0), b))
        .collect();

    let (height, width) = (image.height(), image.width());
    let mut out = Array3::<f64>::zeros((RGB_BAND_COUNT, height, width));
    for (b, expr) in parsed.iter().enumerate() {
        let mut plane = Array2::<f64>::zeros((height, width));
        for row in 0..height {
            for col in 0..width {
                let v = expr.eval(&bands, row, col);
                // NaN/Inf would corrupt rescaling and encoding downstream
                plane[[row, col]] = if v.is_finite() { v } else { 0.0 };
            }
        }
        out.index_axis_mut(ndarray::Axis(0), b).assign(&plane);
    }

    debug!(bands = RGB_BAND_COUNT, "evaluated RGB expression");
    Ok(image.with_bands(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3, array};

    fn two_band_composite() -> CompositeImage {
        // A = [[1, 2]], B = [[3, 4]]
        let mut data = Array3::<f64>::zeros((2, 1, 2));
        data.index_axis_mut(ndarray::Axis(0), 0)
            .assign(&array![[1.0, 2.0]]);
        data.index_axis_mut(ndarray::Axis(0), 1)
            .assign(&array![[3.0, 4.0]]);
        CompositeImage {
            data,
            mask: Array2::from_elem((1, 2), 255),
            epsg: 4326,
            extent: [0.0, 0.0, 2.0, 1.0],
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn elementwise_arithmetic_over_bands() {
        let image = two_band_composite();
        let out =
            evaluate_rgb_expression(&image, &names(&["A", "B"]), "A+B, A-B, A*B").unwrap();
        assert_eq!(out.band_count(), 3);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 0), array![[4.0, 6.0]]);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 1), array![[-2.0, -2.0]]);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 2), array![[3.0, 8.0]]);
        assert_eq!(out.mask, image.mask);
    }

    #[test]
    fn division_by_zero_sanitizes_to_zero() {
        let mut image = two_band_composite();
        image.data[[1, 0, 0]] = 0.0; // B[0][0] = 0 -> A/B = inf
        let out =
            evaluate_rgb_expression(&image, &names(&["A", "B"]), "A/B, A, B").unwrap();
        assert_eq!(out.data[[0, 0, 0]], 0.0);
        // 2 / 4 stays untouched
        assert_eq!(out.data[[0, 0, 1]], 0.5);
    }

    #[test]
    fn zero_over_zero_sanitizes_to_zero() {
        let mut image = two_band_composite();
        image.data[[0, 0, 0]] = 0.0;
        image.data[[1, 0, 0]] = 0.0;
        let out =
            evaluate_rgb_expression(&image, &names(&["A", "B"]), "A/B, A, B").unwrap();
        assert_eq!(out.data[[0, 0, 0]], 0.0);
    }

    #[test]
    fn comparisons_yield_indicator_values() {
        let image = two_band_composite();
        let out = evaluate_rgb_expression(
            &image,
            &names(&["A", "B"]),
            "(A < B) * 10, A >= 2, B == 3",
        )
        .unwrap();
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 0), array![[10.0, 10.0]]);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 1), array![[0.0, 1.0]]);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 2), array![[1.0, 0.0]]);
    }

    #[test]
    fn unknown_band_reference_fails() {
        let image = two_band_composite();
        let err =
            evaluate_rgb_expression(&image, &names(&["A", "B"]), "A+C, A, B").unwrap_err();
        assert!(matches!(err, Error::Expression { ref reason } if reason.contains("'C'")));
    }

    #[test]
    fn band_count_mismatch_fails() {
        let image = two_band_composite();
        assert!(matches!(
            evaluate_rgb_expression(&image, &names(&["A", "B"]), "A, B"),
            Err(Error::Expression { .. })
        ));
        assert!(matches!(
            evaluate_rgb_expression(&image, &names(&["A", "B"]), "A, B, A, B"),
            Err(Error::Expression { .. })
        ));
    }

    #[test]
    fn malformed_expression_fails() {
        let image = two_band_composite();
        for bad in ["A +, B, A", "A*(B, A, B", "A & B, A, B"] {
            assert!(
                matches!(
                    evaluate_rgb_expression(&image, &names(&["A", "B"]), bad),
                    Err(Error::Expression { .. })
                ),
                "expected parse failure for {bad:?}"
            );
        }
    }

    #[test]
    fn unary_minus_and_precedence() {
        let image = two_band_composite();
        let out = evaluate_rgb_expression(
            &image,
            &names(&["A", "B"]),
            "-A + B * 2, (A + B) / 2, A - -B",
        )
        .unwrap();
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 0), array![[5.0, 6.0]]);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 1), array![[2.0, 3.0]]);
        assert_eq!(out.data.index_axis(ndarray::Axis(0), 2), array![[4.0, 6.0]]);
    }
}
