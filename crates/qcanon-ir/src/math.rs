//! Scalar math expressions used as operator coefficients.

use std::fmt;
use std::hash::Hasher;

use num_complex::Complex64;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Named unary functions available in coefficient expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MathFunc {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
    Abs,
    Conj,
}

impl MathFunc {
    /// All supported functions.
    pub const ALL: [MathFunc; 14] = [
        MathFunc::Sin,
        MathFunc::Cos,
        MathFunc::Tan,
        MathFunc::Exp,
        MathFunc::Log,
        MathFunc::Sqrt,
        MathFunc::Sinh,
        MathFunc::Cosh,
        MathFunc::Tanh,
        MathFunc::Asin,
        MathFunc::Acos,
        MathFunc::Atan,
        MathFunc::Abs,
        MathFunc::Conj,
    ];

    /// The textual name of the function.
    pub fn name(self) -> &'static str {
        match self {
            MathFunc::Sin => "sin",
            MathFunc::Cos => "cos",
            MathFunc::Tan => "tan",
            MathFunc::Exp => "exp",
            MathFunc::Log => "log",
            MathFunc::Sqrt => "sqrt",
            MathFunc::Sinh => "sinh",
            MathFunc::Cosh => "cosh",
            MathFunc::Tanh => "tanh",
            MathFunc::Asin => "asin",
            MathFunc::Acos => "acos",
            MathFunc::Atan => "atan",
            MathFunc::Abs => "abs",
            MathFunc::Conj => "conj",
        }
    }

    /// Look a function up by its textual name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Apply the function to a complex argument.
    pub fn apply(self, z: Complex64) -> Complex64 {
        match self {
            MathFunc::Sin => z.sin(),
            MathFunc::Cos => z.cos(),
            MathFunc::Tan => z.tan(),
            MathFunc::Exp => z.exp(),
            MathFunc::Log => z.ln(),
            MathFunc::Sqrt => z.sqrt(),
            MathFunc::Sinh => z.sinh(),
            MathFunc::Cosh => z.cosh(),
            MathFunc::Tanh => z.tanh(),
            MathFunc::Asin => z.asin(),
            MathFunc::Acos => z.acos(),
            MathFunc::Atan => z.atan(),
            MathFunc::Abs => Complex64::new(z.norm(), 0.0),
            MathFunc::Conj => z.conj(),
        }
    }
}

/// A symbolic scalar expression.
///
/// Numeric literals are complex so that phases produced by operator algebra
/// (for example the `i` in `X·Y = iZ`) stay exact literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MathExpr {
    /// A numeric literal.
    Num(Complex64),
    /// A named variable.
    Var(String),
    /// Negation.
    Neg(Box<MathExpr>),
    /// Addition.
    Add(Box<MathExpr>, Box<MathExpr>),
    /// Subtraction.
    Sub(Box<MathExpr>, Box<MathExpr>),
    /// Multiplication.
    Mul(Box<MathExpr>, Box<MathExpr>),
    /// Division.
    Div(Box<MathExpr>, Box<MathExpr>),
    /// Exponentiation.
    Pow(Box<MathExpr>, Box<MathExpr>),
    /// Named unary function.
    Func(MathFunc, Box<MathExpr>),
    /// Unparsed text, parsed on demand by the compile passes.
    Raw(String),
}

impl MathExpr {
    /// Create a real literal.
    pub fn real(value: f64) -> Self {
        MathExpr::Num(Complex64::new(value, 0.0))
    }

    /// Create a complex literal.
    pub fn complex(re: f64, im: f64) -> Self {
        MathExpr::Num(Complex64::new(re, im))
    }

    /// The imaginary unit.
    pub fn imag() -> Self {
        MathExpr::Num(Complex64::i())
    }

    /// Create a variable.
    pub fn var(name: impl Into<String>) -> Self {
        MathExpr::Var(name.into())
    }

    /// Create a raw textual expression.
    pub fn raw(text: impl Into<String>) -> Self {
        MathExpr::Raw(text.into())
    }

    /// Apply a named function.
    pub fn func(func: MathFunc, arg: MathExpr) -> Self {
        MathExpr::Func(func, Box::new(arg))
    }

    /// Raise to a power.
    pub fn pow(self, exponent: MathExpr) -> Self {
        MathExpr::Pow(Box::new(self), Box::new(exponent))
    }

    /// The literal value, if this is a literal.
    pub fn as_num(&self) -> Option<Complex64> {
        match self {
            MathExpr::Num(z) => Some(*z),
            _ => None,
        }
    }

    /// Check whether this is the literal `value`.
    pub fn is_num(&self, value: f64) -> bool {
        self.as_num() == Some(Complex64::new(value, 0.0))
    }

    /// Ordering tag of the node kind. Literals sort first so that numeric
    /// factors lead a product.
    pub fn kind_tag(&self) -> u8 {
        match self {
            MathExpr::Num(_) => 0,
            MathExpr::Var(_) => 1,
            MathExpr::Pow(..) => 2,
            MathExpr::Func(..) => 3,
            MathExpr::Div(..) => 4,
            MathExpr::Mul(..) => 5,
            MathExpr::Add(..) => 6,
            MathExpr::Sub(..) => 7,
            MathExpr::Neg(_) => 8,
            MathExpr::Raw(_) => 9,
        }
    }

    /// Deterministic hash of the tree structure.
    ///
    /// Equal trees (under `PartialEq`) always hash equal; `-0.0` and `0.0`
    /// are folded together.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_into(&mut hasher);
        hasher.finish()
    }

    fn hash_into(&self, hasher: &mut FxHasher) {
        hasher.write_u8(self.kind_tag());
        match self {
            MathExpr::Num(z) => {
                hasher.write_u64(float_bits(z.re));
                hasher.write_u64(float_bits(z.im));
            }
            MathExpr::Var(name) | MathExpr::Raw(name) => hasher.write(name.as_bytes()),
            MathExpr::Neg(e) => e.hash_into(hasher),
            MathExpr::Func(func, e) => {
                hasher.write(func.name().as_bytes());
                e.hash_into(hasher);
            }
            MathExpr::Add(a, b)
            | MathExpr::Sub(a, b)
            | MathExpr::Mul(a, b)
            | MathExpr::Div(a, b)
            | MathExpr::Pow(a, b) => {
                a.hash_into(hasher);
                b.hash_into(hasher);
            }
        }
    }

    /// Sort key used to order operands of commutative operators.
    pub fn order_key(&self) -> (u8, u64) {
        (self.kind_tag(), self.structural_hash())
    }

    /// Check if this expression references any variable or raw text.
    pub fn is_symbolic(&self) -> bool {
        match self {
            MathExpr::Num(_) => false,
            MathExpr::Var(_) | MathExpr::Raw(_) => true,
            MathExpr::Neg(e) | MathExpr::Func(_, e) => e.is_symbolic(),
            MathExpr::Add(a, b)
            | MathExpr::Sub(a, b)
            | MathExpr::Mul(a, b)
            | MathExpr::Div(a, b)
            | MathExpr::Pow(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }
}

fn float_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

fn write_num(f: &mut fmt::Formatter<'_>, z: Complex64) -> fmt::Result {
    if z.im == 0.0 {
        if z.re.is_sign_negative() {
            write!(f, "({})", z.re)
        } else {
            write!(f, "{}", z.re)
        }
    } else if z.re == 0.0 {
        write!(f, "({} * i)", z.im)
    } else if z.im < 0.0 {
        write!(f, "({} - {} * i)", z.re, -z.im)
    } else {
        write!(f, "({} + {} * i)", z.re, z.im)
    }
}

impl fmt::Display for MathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathExpr::Num(z) => write_num(f, *z),
            MathExpr::Var(name) => write!(f, "{name}"),
            MathExpr::Raw(text) => write!(f, "{text}"),
            // `(-2)` reads back as a negative literal, so a negated literal
            // keeps its own parentheses.
            MathExpr::Neg(e) if matches!(e.as_ref(), MathExpr::Num(_)) => write!(f, "(-({e}))"),
            MathExpr::Neg(e) => write!(f, "(-{e})"),
            MathExpr::Add(a, b) => write!(f, "({a} + {b})"),
            MathExpr::Sub(a, b) => write!(f, "({a} - {b})"),
            MathExpr::Mul(a, b) => write!(f, "({a} * {b})"),
            MathExpr::Div(a, b) => write!(f, "({a} / {b})"),
            MathExpr::Pow(a, b) => write!(f, "({a} ** {b})"),
            MathExpr::Func(func, e) => write!(f, "{}({e})", func.name()),
        }
    }
}

impl From<f64> for MathExpr {
    fn from(value: f64) -> Self {
        MathExpr::real(value)
    }
}

impl From<i32> for MathExpr {
    fn from(value: i32) -> Self {
        MathExpr::real(f64::from(value))
    }
}

impl From<Complex64> for MathExpr {
    fn from(value: Complex64) -> Self {
        MathExpr::Num(value)
    }
}

impl std::ops::Add for MathExpr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        MathExpr::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for MathExpr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        MathExpr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for MathExpr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        MathExpr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for MathExpr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        MathExpr::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for MathExpr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        MathExpr::Neg(Box::new(self))
    }
}
