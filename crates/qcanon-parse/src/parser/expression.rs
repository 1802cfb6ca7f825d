//! Expression parsing with precedence climbing.

use qcanon_ir::{MathExpr, MathFunc};

use super::Parser;
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

/// Binary operators handled by precedence climbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Parser {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<MathExpr> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<MathExpr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance(); // consume operator

            let right = self.parse_binary_expr(prec + 1)?;
            left = match op {
                BinOp::Add => left + right,
                BinOp::Sub => left - right,
                BinOp::Mul => left * right,
                BinOp::Div => left / right,
            };
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<MathExpr> {
        if self.check(&Token::Minus) && self.negative_literal_follows() {
            self.advance();
            return match self.parse_primary_expr()? {
                MathExpr::Num(z) => Ok(MathExpr::Num(-z)),
                other => Ok(-other),
            };
        }
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(-expr);
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary_expr();
        }
        self.parse_power_expr()
    }

    /// Parse exponentiation; right associative, binds tighter than unary minus.
    fn parse_power_expr(&mut self) -> ParseResult<MathExpr> {
        let base = self.parse_primary_expr()?;
        if self.consume(&Token::Power) || self.consume(&Token::Caret) {
            let exponent = self.parse_unary_expr()?;
            return Ok(base.pow(exponent));
        }
        Ok(base)
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<MathExpr> {
        let position = self.position();
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => {
                self.advance();
                #[allow(clippy::cast_precision_loss)]
                let value = v as f64;
                Ok(MathExpr::real(value))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                Ok(MathExpr::real(v))
            }
            Token::Imag => {
                self.advance();
                Ok(MathExpr::imag())
            }
            Token::Pi => {
                self.advance();
                Ok(MathExpr::real(std::f64::consts::PI))
            }
            Token::Identifier(name) => {
                self.advance();
                // Check for function call
                if self.consume(&Token::LParen) {
                    let func = MathFunc::from_name(&name)
                        .ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
                    let arg = self.parse_expression()?;
                    self.expect(Token::RParen)?;
                    Ok(MathExpr::func(func, arg))
                } else {
                    Ok(MathExpr::Var(name))
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            _ => Err(ParseError::UnexpectedToken {
                position,
                expected: "expression".into(),
                found: token.to_string(),
            }),
        }
    }

    /// A `-` directly before a numeric literal that is not a power base.
    fn negative_literal_follows(&self) -> bool {
        let literal = matches!(
            self.peek_nth(1),
            Some(Token::IntLiteral(_) | Token::FloatLiteral(_))
        );
        literal && !matches!(self.peek_nth(2), Some(Token::Power | Token::Caret))
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            _ => None,
        }
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
    }
}
