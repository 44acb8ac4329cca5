//! Arithmetic: constants, element-wise functions and binary combinations

use crate::ast::{Arg, Expr, Pipeline};
use crate::error::ValidationError;

impl Pipeline {
    pub fn add_c(&self, constant: f64) -> Result<Pipeline, ValidationError> {
        self.with_operation("addc", vec![Arg::from(constant)])
    }

    pub fn sub_c(&self, constant: f64) -> Result<Pipeline, ValidationError> {
        self.with_operation("subc", vec![Arg::from(constant)])
    }

    pub fn mul_c(&self, constant: f64) -> Result<Pipeline, ValidationError> {
        self.with_operation("mulc", vec![Arg::from(constant)])
    }

    /// Divide by a non-zero constant
    pub fn div_c(&self, constant: f64) -> Result<Pipeline, ValidationError> {
        if constant == 0.0 {
            return Err(ValidationError::out_of_range(
                "divc",
                "constant",
                constant,
                "a non-zero value",
            ));
        }
        self.with_operation("divc", vec![Arg::from(constant)])
    }

    pub fn abs(&self) -> Pipeline {
        self.then_static("abs")
    }

    pub fn sqrt(&self) -> Pipeline {
        self.then_static("sqrt")
    }

    pub fn exp(&self) -> Pipeline {
        self.then_static("exp")
    }

    pub fn ln(&self) -> Pipeline {
        self.then_static("ln")
    }
}

macro_rules! binary_ops {
    ($($(#[$doc:meta])* $func:ident => $op:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $func(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
                Expr::combine_static($op, left, right)
            }
        )*
    };
}

binary_ops! {
    /// Element-wise `left + right`
    add => "add";
    /// Element-wise `left - right`
    sub => "sub";
    mul => "mul";
    div => "div";
    min => "min";
    max => "max";
    atan2 => "atan2";
    eq => "eq";
    ne => "ne";
    lt => "lt";
    le => "le";
    gt => "gt";
    ge => "ge";
    /// Keep `right` where `left` is non-zero
    ifthen => "ifthen";
    /// Subtract a multi-year monthly climatology (anomalies)
    ymon_sub => "ymonsub";
    ymon_add => "ymonadd";
    yday_sub => "ydaysub";
    year_sub => "yearsub";
    month_sub => "monsub";
}
