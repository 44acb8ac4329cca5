//! Operator catalog
//!
//! Thin validated wrappers over `Pipeline::with_operation`. Each wrapper
//! declares its own minimum arity and range rules; failures name the
//! wrapper's parameter so callers can report them without guessing.
//!
//! The grammar table (`input_arity`) records how many input expressions an
//! operator consumes. The fragment reader relies on it to rebuild trees.

mod arith;
mod info;
mod modify;
mod select;
mod stats;

pub use arith::*;
pub use info::*;
pub use modify::CALENDARS;

use crate::ast::Arg;
use crate::error::ValidationError;

/// Argument count rule for one operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgRule {
    pub operator: &'static str,
    /// Parameter name reported in validation errors
    pub parameter: &'static str,
    pub min: usize,
    pub max: Option<usize>,
    /// Values come in pairs, so the count must be even
    pub pairs: bool,
}

impl ArgRule {
    const fn at_least(operator: &'static str, parameter: &'static str, min: usize) -> Self {
        ArgRule {
            operator,
            parameter,
            min,
            max: None,
            pairs: false,
        }
    }

    const fn between(operator: &'static str, parameter: &'static str, min: usize, max: usize) -> Self {
        ArgRule {
            operator,
            parameter,
            min,
            max: Some(max),
            pairs: false,
        }
    }

    const fn pairs(operator: &'static str, parameter: &'static str) -> Self {
        ArgRule {
            operator,
            parameter,
            min: 2,
            max: None,
            pairs: true,
        }
    }

    /// Check an argument count against this rule
    pub fn check(&self, count: usize) -> Result<(), ValidationError> {
        if count == 0 && self.min > 0 {
            return Err(ValidationError::empty(self.operator, self.parameter));
        }
        let too_many = self.max.map_or(false, |max| count > max);
        if count < self.min || too_many {
            let expected = match self.max {
                Some(max) if max == self.min => format!("exactly {} values", max),
                Some(max) => format!("{}..={} values", self.min, max),
                None => format!("at least {} values", self.min),
            };
            return Err(ValidationError::out_of_range(
                self.operator,
                self.parameter,
                count,
                expected,
            ));
        }
        if self.pairs && count % 2 != 0 {
            return Err(ValidationError::out_of_range(
                self.operator,
                self.parameter,
                count,
                "an even number of values",
            ));
        }
        Ok(())
    }
}

const RULES: &[ArgRule] = &[
    ArgRule::at_least("selname", "names", 1),
    ArgRule::at_least("selvar", "names", 1),
    ArgRule::at_least("selcode", "codes", 1),
    ArgRule::at_least("sellevel", "levels", 1),
    ArgRule::at_least("selyear", "years", 1),
    ArgRule::at_least("selmon", "months", 1),
    ArgRule::at_least("selseas", "seasons", 1),
    ArgRule::between("seldate", "dates", 1, 2),
    ArgRule::at_least("seltimestep", "steps", 1),
    ArgRule::between("sellonlatbox", "bounds", 4, 4),
    ArgRule::between("selindexbox", "indices", 4, 4),
    ArgRule::at_least("delname", "names", 1),
    ArgRule::between("runmean", "window", 1, 1),
    ArgRule::between("addc", "constant", 1, 1),
    ArgRule::between("subc", "constant", 1, 1),
    ArgRule::between("mulc", "constant", 1, 1),
    ArgRule::between("divc", "constant", 1, 1),
    ArgRule::between("setname", "name", 1, 1),
    ArgRule::between("setunit", "unit", 1, 1),
    ArgRule::between("setmissval", "value", 1, 1),
    ArgRule::pairs("chname", "pairs"),
    ArgRule::between("setcalendar", "calendar", 1, 1),
    ArgRule::between("remapbil", "grid", 1, 1),
    ArgRule::between("remapbic", "grid", 1, 1),
    ArgRule::between("remapnn", "grid", 1, 1),
    ArgRule::between("remapcon", "grid", 1, 1),
    ArgRule::between("remapdis", "grid", 1, 1),
    ArgRule::at_least("intlevel", "levels", 1),
];

/// Argument rule for a catalog operator, if it has one
pub fn rule(operator: &str) -> Option<&'static ArgRule> {
    RULES.iter().find(|r| r.operator == operator)
}

/// Operators that combine two input expressions
pub const BINARY_OPERATORS: &[&str] = &[
    "add", "sub", "mul", "div", "min", "max", "atan2", "eq", "ne", "lt", "le", "gt", "ge",
    "ifthen", "ymonsub", "ymonadd", "ydaysub", "yearsub", "monsub",
];

/// Number of input expressions `operator` consumes (1 or 2)
pub fn input_arity(operator: &str) -> usize {
    if BINARY_OPERATORS.contains(&operator) {
        2
    } else {
        1
    }
}

/// Require a non-empty list and convert it into arguments
pub(crate) fn non_empty<T: Clone + Into<Arg>>(
    operation: &str,
    parameter: &str,
    values: &[T],
) -> Result<Vec<Arg>, ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::empty(operation, parameter));
    }
    Ok(values.iter().cloned().map(Into::into).collect())
}

/// Check that every value lies within `lo..=hi`
pub(crate) fn in_range<T>(
    operation: &str,
    parameter: &str,
    values: &[T],
    lo: T,
    hi: T,
) -> Result<(), ValidationError>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    match values.iter().find(|v| **v < lo || **v > hi) {
        Some(bad) => Err(ValidationError::out_of_range(
            operation,
            parameter,
            bad,
            format!("{}..={}", lo, hi),
        )),
        None => Ok(()),
    }
}
