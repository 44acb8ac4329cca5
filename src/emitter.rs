//! Emitter: converts an expression tree into a cdo command line
//!
//! Unary chains render newest operator first (`-yearmean -selname,tas in.nc`).
//! Binary nodes render flat as `-op <left> <right>`; operator arity makes the
//! placement unambiguous, so no grouping tokens are emitted.

use std::fmt;
use std::str::FromStr;

use crate::ast::{validate_source, ExprRef, OperationSpec, Source};
use crate::error::{CdoError, Result};

/// Default tool invocation token
pub const DEFAULT_INVOCATION: &str = "cdo";

enum Work<'a> {
    Node(ExprRef<'a>),
    Op(&'a OperationSpec),
    Path(&'a str),
}

/// Serialize an expression into its fragment tokens
///
/// Iterative, so nesting depth is bounded by memory rather than the stack.
pub fn emit_tokens<'a>(expr: impl Into<ExprRef<'a>>) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut pending = vec![Work::Node(expr.into())];

    while let Some(work) = pending.pop() {
        match work {
            Work::Op(op) => out.push(op.fragment()),
            Work::Path(path) => out.push(path.to_string()),
            Work::Node(ExprRef::Binary(b)) => {
                pending.push(Work::Node(b.right().as_ref()));
                pending.push(Work::Node(b.left().as_ref()));
                pending.push(Work::Op(b.operator()));
            }
            Work::Node(ExprRef::Pipeline(p)) => {
                match p.source() {
                    Source::Unbound => {
                        let fragment = p
                            .latest_first()
                            .map(|op| op.fragment())
                            .collect::<Vec<_>>()
                            .join(" ");
                        return Err(CdoError::MissingSource { fragment });
                    }
                    Source::Path(path) => {
                        validate_source(path)?;
                        pending.push(Work::Path(path));
                    }
                    Source::Combined(b) => pending.push(Work::Node(ExprRef::Binary(b))),
                }
                // Oldest pushed first so the newest pops first
                for op in p.operations() {
                    pending.push(Work::Op(op));
                }
            }
        }
    }

    Ok(out)
}

/// Serialize an expression without invocation or options
pub fn emit_fragment<'a>(expr: impl Into<ExprRef<'a>>) -> Result<String> {
    Ok(emit_tokens(expr)?.join(" "))
}

/// Options placed between the invocation token and the expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalOption {
    /// `-O`: overwrite existing output
    Overwrite,
    /// `-s`: silent mode
    Silent,
    /// `-L`: lock I/O
    Lock,
    /// `-f <fmt>`: output file format
    Format(String),
    /// `-P <n>`: OpenMP threads
    Threads(u32),
    /// `--reduce_dim`
    ReduceDim,
    /// Any other single token, passed through
    Raw(String),
}

impl GlobalOption {
    pub fn tokens(&self) -> Vec<String> {
        match self {
            GlobalOption::Overwrite => vec!["-O".into()],
            GlobalOption::Silent => vec!["-s".into()],
            GlobalOption::Lock => vec!["-L".into()],
            GlobalOption::Format(fmt) => vec!["-f".into(), fmt.clone()],
            GlobalOption::Threads(n) => vec!["-P".into(), n.to_string()],
            GlobalOption::ReduceDim => vec!["--reduce_dim".into()],
            GlobalOption::Raw(token) => vec![token.clone()],
        }
    }
}

impl fmt::Display for GlobalOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

impl FromStr for GlobalOption {
    type Err = CdoError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let flag = parts
            .next()
            .ok_or_else(|| CdoError::Config("empty global option".into()))?;
        let value = parts.next();
        if parts.next().is_some() {
            return Err(CdoError::Config(format!("too many tokens in option '{}'", s)));
        }

        let option = match (flag, value) {
            ("-O", None) => GlobalOption::Overwrite,
            ("-s", None) => GlobalOption::Silent,
            ("-L", None) => GlobalOption::Lock,
            ("--reduce_dim", None) => GlobalOption::ReduceDim,
            ("-f", Some(fmt)) => GlobalOption::Format(fmt.to_string()),
            ("-P", Some(n)) => GlobalOption::Threads(
                n.parse()
                    .map_err(|_| CdoError::Config(format!("invalid thread count '{}'", n)))?,
            ),
            ("-f", None) | ("-P", None) => {
                return Err(CdoError::Config(format!("option '{}' needs a value", flag)))
            }
            (raw, None) => GlobalOption::Raw(raw.to_string()),
            (_, Some(_)) => {
                return Err(CdoError::Config(format!("unknown option with value '{}'", s)))
            }
        };
        Ok(option)
    }
}

/// Builds full command lines: `<invocation> [options...] <expression>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesizer {
    invocation: String,
    options: Vec<GlobalOption>,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Synthesizer::new(DEFAULT_INVOCATION)
    }
}

impl Synthesizer {
    pub fn new(invocation: impl Into<String>) -> Self {
        Synthesizer {
            invocation: invocation.into(),
            options: Vec::new(),
        }
    }

    /// Add a global option; options keep the order they were added in
    pub fn with_option(mut self, option: GlobalOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn invocation(&self) -> &str {
        &self.invocation
    }

    pub fn options(&self) -> &[GlobalOption] {
        &self.options
    }

    /// Command line as separate tokens
    pub fn argv<'a>(&self, expr: impl Into<ExprRef<'a>>) -> Result<Vec<String>> {
        let mut argv = vec![self.invocation.clone()];
        for option in &self.options {
            argv.extend(option.tokens());
        }
        argv.extend(emit_tokens(expr)?);
        Ok(argv)
    }

    /// Command line for a report or any run whose result is printed text
    pub fn synthesize<'a>(&self, expr: impl Into<ExprRef<'a>>) -> Result<String> {
        let command = self.argv(expr)?.join(" ");
        log::debug!("synthesized: {}", command);
        Ok(command)
    }

    /// Command line writing its result to `output`
    pub fn synthesize_to<'a>(&self, expr: impl Into<ExprRef<'a>>, output: &str) -> Result<String> {
        let mut argv = self.argv(expr)?;
        argv.push(output.to_string());
        let command = argv.join(" ");
        log::debug!("synthesized: {}", command);
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, OperationSpec, Pipeline};

    fn op(name: &str) -> OperationSpec {
        OperationSpec::bare(name).unwrap()
    }

    #[test]
    fn emit_empty_pipeline_is_source() {
        assert_eq!(emit_fragment(&Pipeline::bind("data.nc")).unwrap(), "data.nc");
    }

    #[test]
    fn emit_unary_chain_reversed() {
        let p = Pipeline::bind("data.nc")
            .with_operation("selname", vec!["tas".into()])
            .unwrap()
            .then(op("yearmean"));
        assert_eq!(
            Synthesizer::default().synthesize(&p).unwrap(),
            "cdo -yearmean -selname,tas data.nc"
        );
    }

    #[test]
    fn emit_binary_flat() {
        let left = Pipeline::bind("a.nc").then(op("yearmean"));
        let expr = Expr::combine("sub", left, Pipeline::bind("b.nc")).unwrap();
        assert_eq!(
            Synthesizer::default().synthesize(&expr).unwrap(),
            "cdo -sub -yearmean a.nc b.nc"
        );
    }

    #[test]
    fn emit_unary_over_binary() {
        let expr = Expr::combine("sub", Pipeline::bind("a.nc"), Pipeline::bind("b.nc")).unwrap();
        let p = expr.into_pipeline().then(op("fldmean"));
        assert_eq!(emit_fragment(&p).unwrap(), "-fldmean -sub a.nc b.nc");
    }

    #[test]
    fn emit_missing_source() {
        let p = Pipeline::unbound().then(op("yearmean"));
        match emit_fragment(&p) {
            Err(CdoError::MissingSource { fragment }) => assert_eq!(fragment, "-yearmean"),
            other => panic!("expected MissingSource, got {:?}", other),
        }
    }

    #[test]
    fn emit_missing_source_inside_binary() {
        let expr = Expr::combine("add", Pipeline::bind("a.nc"), Pipeline::unbound()).unwrap();
        assert!(matches!(
            emit_fragment(&expr),
            Err(CdoError::MissingSource { .. })
        ));
    }

    #[test]
    fn emit_deep_nesting() {
        let mut expr = Expr::from(Pipeline::bind("x.nc"));
        for _ in 0..5_000 {
            expr = Expr::combine("add", expr, Pipeline::bind("y.nc")).unwrap();
        }
        let tokens = emit_tokens(&expr).unwrap();
        assert_eq!(tokens.len(), 5_000 * 2 + 1);
        assert_eq!(tokens[0], "-add");
        assert_eq!(tokens[5_000], "x.nc");
    }

    #[test]
    fn deep_tree_builds_emits_and_drops_on_small_stack() {
        let worker = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let build = || {
                    let mut expr = Expr::from(Pipeline::bind("x.nc"));
                    for _ in 0..200_000 {
                        expr = Expr::combine("add", expr, Pipeline::bind("y.nc")).unwrap();
                    }
                    expr
                };
                let expr = build();
                let tokens = emit_tokens(&expr).unwrap();
                assert_eq!(tokens.len(), 200_000 * 2 + 1);
                assert_eq!(build(), expr);
                let rebound = expr.bind_unbound("z.nc").unwrap();
                drop(rebound);
                drop(expr);
            })
            .unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn emit_rejects_unusable_paths() {
        let spaced = Pipeline::bind("my data.nc").then(op("yearmean"));
        match emit_fragment(&spaced) {
            Err(CdoError::Validation(err)) => assert_eq!(err.parameter, "source"),
            other => panic!("expected Validation, got {:?}", other),
        }
        let empty = Pipeline::bind("").then(op("yearmean"));
        assert!(matches!(emit_fragment(&empty), Err(CdoError::Validation(_))));
        let inner = Expr::combine("add", Pipeline::bind("a.nc"), Pipeline::bind("b c.nc")).unwrap();
        assert!(matches!(emit_fragment(&inner), Err(CdoError::Validation(_))));
    }

    #[test]
    fn global_options_in_order() {
        let synth = Synthesizer::default()
            .with_option(GlobalOption::Overwrite)
            .with_option(GlobalOption::Format("nc4".into()))
            .with_option(GlobalOption::Threads(4));
        let p = Pipeline::bind("in.nc").then(op("timmean"));
        assert_eq!(
            synth.synthesize_to(&p, "out.nc").unwrap(),
            "cdo -O -f nc4 -P 4 -timmean in.nc out.nc"
        );
    }

    #[test]
    fn parse_global_options() {
        assert_eq!("-O".parse::<GlobalOption>().unwrap(), GlobalOption::Overwrite);
        assert_eq!(
            "-f nc4".parse::<GlobalOption>().unwrap(),
            GlobalOption::Format("nc4".into())
        );
        assert_eq!("-P 8".parse::<GlobalOption>().unwrap(), GlobalOption::Threads(8));
        assert_eq!(
            "--no_history".parse::<GlobalOption>().unwrap(),
            GlobalOption::Raw("--no_history".into())
        );
        assert!("-P many".parse::<GlobalOption>().is_err());
        assert!("-f".parse::<GlobalOption>().is_err());
        assert!("".parse::<GlobalOption>().is_err());
    }

    #[test]
    fn option_display_round_trips() {
        let opt = GlobalOption::Format("grb2".into());
        assert_eq!(opt.to_string().parse::<GlobalOption>().unwrap(), opt);
    }
}
