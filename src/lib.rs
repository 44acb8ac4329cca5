//! cdoq - composable cdo command expressions
//!
//! # Overview
//!
//! cdoq builds command lines for the Climate Data Operators tool from an
//! immutable expression tree, and turns the tool's printed reports into
//! typed records.
//!
//! # Core Concepts
//!
//! ## Pipelines
//!
//! ```text
//! # Operators are chained in the order they apply
//! bind(data.nc) . selname(tas) . yearmean
//!
//! # and emitted newest first, input last
//! cdo -yearmean -selname,tas data.nc
//! ```
//!
//! Every builder call returns a new pipeline; the receiver is untouched, so a
//! pipeline can be shared as a template and extended in several directions.
//!
//! ## Binary operators
//!
//! ```text
//! sub(yearmean(a.nc), b.nc)   # cdo -sub -yearmean a.nc b.nc
//! ```
//!
//! The tool infers grouping from operator arity, so no brackets are emitted.
//!
//! ## Reports
//!
//! Printing operators (`sinfo`, `griddes`, `showname`, ...) end a pipeline.
//! Their text output goes through a `ParserRegistry` keyed by operator name.
//!
//! # Example
//!
//! ```rust
//! use cdoq::{Pipeline, Synthesizer};
//!
//! let tas = Pipeline::bind("data.nc").select_name(&["tas"]).unwrap();
//! let yearly = tas.year_mean();
//! let cmd = Synthesizer::default().synthesize(&yearly).unwrap();
//! assert_eq!(cmd, "cdo -yearmean -selname,tas data.nc");
//! ```

pub mod ast;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod report;
pub mod session;

#[cfg(feature = "config")]
pub mod config;

pub use ast::{Arg, BinaryExpr, Expr, ExprRef, OperationSpec, Pipeline, Source};
pub use emitter::{emit_fragment, GlobalOption, Synthesizer};
pub use error::{CdoError, Result, ValidationError, ValidationErrorKind};
pub use executor::{ExecuteError, Executor, ProcessExecutor};
pub use parser::{parse_fragment, GrammarError};
pub use report::{ParseError, Parser, ParserRegistry, Report, ReportParser};
pub use session::Cdo;

#[cfg(feature = "config")]
pub use config::Config;
