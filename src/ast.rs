//! Expression tree for cdo pipelines
//!
//! The tree is made of two node shapes:
//! - `Pipeline`: a chain of unary operators applied to one source
//! - `BinaryExpr`: an operator combining two sub-expressions
//!
//! Every value is immutable. Builder calls return a new value and leave the
//! receiver untouched, so a base pipeline can be branched into any number of
//! derived pipelines. Operations live in a persistent list (newest first), and
//! clones share the unchanged prefix.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{ValidationError, ValidationErrorKind};
use crate::operators;

/// Separator between an operator name and its arguments
pub const ARG_SEPARATOR: char = ',';

/// A single operator argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Arg {
    /// Read an argument token back from command text
    pub fn from_token(token: &str) -> Arg {
        if let Ok(n) = token.parse::<i64>() {
            return Arg::Int(n);
        }
        match token.parse::<f64>() {
            Ok(x) if x.is_finite() => Arg::Float(x),
            _ => Arg::Text(token.to_string()),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(n) => write!(f, "{}", n),
            // f64's Display is the shortest round-trip form and ignores locale
            Arg::Float(x) => write!(f, "{}", x),
            Arg::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n.into())
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(n.into())
    }
}

impl From<f64> for Arg {
    fn from(x: f64) -> Self {
        Arg::Float(x)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

/// Check one argument value for `operation`, reporting failures under `parameter`
pub(crate) fn validate_arg(operation: &str, parameter: &str, arg: &Arg) -> Result<(), ValidationError> {
    match arg {
        Arg::Int(_) => Ok(()),
        Arg::Float(x) if x.is_finite() => Ok(()),
        Arg::Float(x) => Err(ValidationError::new(
            operation,
            parameter,
            ValidationErrorKind::NonFinite { value: *x },
        )),
        Arg::Text(s) if s.is_empty() => Err(ValidationError::empty(operation, parameter)),
        Arg::Text(s) => match s.chars().find(|c| *c == ARG_SEPARATOR || c.is_whitespace()) {
            Some(character) => Err(ValidationError::new(
                operation,
                parameter,
                ValidationErrorKind::InvalidCharacter {
                    value: s.clone(),
                    character,
                },
            )),
            None => Ok(()),
        },
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new(name, "name", ValidationErrorKind::EmptyName));
    }
    match name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        Some(character) => Err(ValidationError::new(
            name,
            "name",
            ValidationErrorKind::InvalidCharacter {
                value: name.to_string(),
                character,
            },
        )),
        None => Ok(()),
    }
}

/// Check a dataset reference: non-empty, one token, not readable as an operator
pub(crate) fn validate_source(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::empty("bind", "source"));
    }
    let reserved = path
        .chars()
        .find(|c| c.is_whitespace())
        .or_else(|| path.starts_with('-').then_some('-'));
    match reserved {
        Some(character) => Err(ValidationError::new(
            "bind",
            "source",
            ValidationErrorKind::InvalidCharacter {
                value: path.to_string(),
                character,
            },
        )),
        None => Ok(()),
    }
}

/// One named operator plus its ordered arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    name: String,
    args: Vec<Arg>,
}

impl OperationSpec {
    /// Validate and build an operation
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_name(&name)?;
        for arg in &args {
            validate_arg(&name, "args", arg)?;
        }
        Ok(OperationSpec { name, args })
    }

    /// Operation without arguments
    pub fn bare(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(name, Vec::new())
    }

    /// Catalog operators whose names are known-good literals
    pub(crate) fn from_static(name: &'static str) -> Self {
        OperationSpec {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Command fragment: `-name` or `-name,arg1,arg2`
    pub fn fragment(&self) -> String {
        let mut out = format!("-{}", self.name);
        for arg in &self.args {
            out.push(ARG_SEPARATOR);
            out.push_str(&arg.to_string());
        }
        out
    }
}

impl fmt::Display for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragment())
    }
}

/// What a pipeline reads from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Not yet bound (reusable template)
    Unbound,
    /// A dataset reference, usually a file path
    Path(String),
    /// The result of a binary combination
    Combined(Arc<BinaryExpr>),
}

#[derive(Debug)]
struct OpNode {
    op: OperationSpec,
    prev: Option<Arc<OpNode>>,
}

impl Drop for OpNode {
    // Unlink long chains iteratively instead of recursing through every node
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => prev = inner.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// An ordered chain of unary operators bound to (or awaiting) a source
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Source,
    head: Option<Arc<OpNode>>,
    len: usize,
}

impl Pipeline {
    /// Start a pipeline reading from a dataset
    pub fn bind(source: impl Into<String>) -> Self {
        Pipeline {
            source: Source::Path(source.into()),
            head: None,
            len: 0,
        }
    }

    /// `bind`, rejecting references that cannot stand as one command token
    pub fn try_bind(source: impl Into<String>) -> Result<Self, ValidationError> {
        let source = source.into();
        validate_source(&source)?;
        Ok(Self::bind(source))
    }

    /// Start a reusable pipeline with no source
    pub fn unbound() -> Self {
        Pipeline {
            source: Source::Unbound,
            head: None,
            len: 0,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Same operations, different source
    pub fn with_source(&self, source: Source) -> Self {
        Pipeline {
            source,
            head: self.head.clone(),
            len: self.len,
        }
    }

    /// Same operations, reading from `path`
    pub fn rebind(&self, path: impl Into<String>) -> Self {
        self.with_source(Source::Path(path.into()))
    }

    /// `rebind` with the checks of `try_bind`
    pub fn try_rebind(&self, path: impl Into<String>) -> Result<Self, ValidationError> {
        let path = path.into();
        validate_source(&path)?;
        Ok(self.rebind(path))
    }

    /// Append a validated operation
    pub fn then(&self, op: OperationSpec) -> Self {
        Pipeline {
            source: self.source.clone(),
            head: Some(Arc::new(OpNode {
                op,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Validate `args` against the operator's catalog rule, then append
    pub fn with_operation(&self, name: &str, args: Vec<Arg>) -> Result<Self, ValidationError> {
        if let Some(rule) = operators::rule(name) {
            rule.check(args.len())?;
            for arg in &args {
                validate_arg(name, rule.parameter, arg)?;
            }
        }
        Ok(self.then(OperationSpec::new(name, args)?))
    }

    /// Append a catalog operator that takes no arguments
    pub(crate) fn then_static(&self, name: &'static str) -> Self {
        self.then(OperationSpec::from_static(name))
    }

    /// Operations from the most recently added to the first
    pub fn latest_first(&self) -> impl Iterator<Item = &OperationSpec> + '_ {
        std::iter::successors(self.head.as_deref(), |node| node.prev.as_deref()).map(|node| &node.op)
    }

    /// Operations in the order they were chained
    pub fn operations(&self) -> Vec<&OperationSpec> {
        let mut ops: Vec<&OperationSpec> = self.latest_first().collect();
        ops.reverse();
        ops
    }

    /// The most recently added operation
    pub fn last(&self) -> Option<&OperationSpec> {
        self.head.as_deref().map(|node| &node.op)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append this pipeline's operations onto `base`, keeping base's source
    pub fn apply_to(&self, base: &Pipeline) -> Pipeline {
        self.operations()
            .into_iter()
            .fold(base.clone(), |acc, op| acc.then(op.clone()))
    }

    /// True when every leaf under this pipeline has a source
    pub fn is_bound(&self) -> bool {
        ExprRef::Pipeline(self).is_bound()
    }
}

impl PartialEq for Pipeline {
    fn eq(&self, other: &Self) -> bool {
        same_tree(ExprRef::Pipeline(self), ExprRef::Pipeline(other))
    }
}

impl From<BinaryExpr> for Pipeline {
    fn from(expr: BinaryExpr) -> Self {
        Pipeline {
            source: Source::Combined(Arc::new(expr)),
            head: None,
            len: 0,
        }
    }
}

/// Two sub-expressions combined by an operator
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    operator: OperationSpec,
    left: Arc<Expr>,
    right: Arc<Expr>,
}

impl BinaryExpr {
    pub fn new(operator: OperationSpec, left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        BinaryExpr {
            operator,
            left: Arc::new(left.into()),
            right: Arc::new(right.into()),
        }
    }

    /// Build from already shared children (e.g. one climatology reused on both sides)
    pub fn from_shared(operator: OperationSpec, left: Arc<Expr>, right: Arc<Expr>) -> Self {
        BinaryExpr { operator, left, right }
    }

    pub fn operator(&self) -> &OperationSpec {
        &self.operator
    }

    pub fn left(&self) -> &Expr {
        &self.left
    }

    pub fn right(&self) -> &Expr {
        &self.right
    }
}

impl PartialEq for BinaryExpr {
    fn eq(&self, other: &Self) -> bool {
        same_tree(ExprRef::Binary(self), ExprRef::Binary(other))
    }
}

/// Shared leaf swapped into a node whose children are being detached
fn detached() -> Arc<Expr> {
    static DETACHED: OnceLock<Arc<Expr>> = OnceLock::new();
    Arc::clone(DETACHED.get_or_init(|| Arc::new(Expr::Pipeline(Pipeline::unbound()))))
}

impl Expr {
    /// Move owned children into `pending`, leaving this node shallow
    fn detach_children(&mut self, pending: &mut Vec<Arc<Expr>>) {
        match self {
            Expr::Binary(b) => {
                pending.push(std::mem::replace(&mut b.left, detached()));
                pending.push(std::mem::replace(&mut b.right, detached()));
            }
            Expr::Pipeline(p) => {
                if let Source::Combined(shared) = std::mem::replace(&mut p.source, Source::Unbound) {
                    if let Ok(mut inner) = Arc::try_unwrap(shared) {
                        pending.push(std::mem::replace(&mut inner.left, detached()));
                        pending.push(std::mem::replace(&mut inner.right, detached()));
                    }
                }
            }
        }
    }
}

impl Drop for BinaryExpr {
    // Unlink deep trees with a work list, like `OpNode`
    fn drop(&mut self) {
        let mut pending = vec![
            std::mem::replace(&mut self.left, detached()),
            std::mem::replace(&mut self.right, detached()),
        ];
        while let Some(child) = pending.pop() {
            if let Ok(mut expr) = Arc::try_unwrap(child) {
                expr.detach_children(&mut pending);
            }
        }
    }
}

/// Structural equality without recursion
fn same_tree(a: ExprRef<'_>, b: ExprRef<'_>) -> bool {
    let mut pending = vec![(a, b)];
    while let Some(pair) = pending.pop() {
        match pair {
            (ExprRef::Pipeline(x), ExprRef::Pipeline(y)) => {
                if x.len != y.len || !x.latest_first().eq(y.latest_first()) {
                    return false;
                }
                match (&x.source, &y.source) {
                    (Source::Unbound, Source::Unbound) => {}
                    (Source::Path(l), Source::Path(r)) if l == r => {}
                    (Source::Combined(l), Source::Combined(r)) => {
                        if !Arc::ptr_eq(l, r) {
                            pending.push((ExprRef::Binary(l), ExprRef::Binary(r)));
                        }
                    }
                    _ => return false,
                }
            }
            (ExprRef::Binary(x), ExprRef::Binary(y)) => {
                if x.operator != y.operator {
                    return false;
                }
                if !Arc::ptr_eq(&x.right, &y.right) {
                    pending.push((x.right().as_ref(), y.right().as_ref()));
                }
                if !Arc::ptr_eq(&x.left, &y.left) {
                    pending.push((x.left().as_ref(), y.left().as_ref()));
                }
            }
            _ => return false,
        }
    }
    true
}

/// Any node of the expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Pipeline(Pipeline),
    Binary(BinaryExpr),
}

impl Expr {
    /// Combine two expressions with a binary operator
    pub fn combine(
        operator: &str,
        left: impl Into<Expr>,
        right: impl Into<Expr>,
    ) -> Result<Expr, ValidationError> {
        let op = OperationSpec::bare(operator)?;
        Ok(Expr::Binary(BinaryExpr::new(op, left, right)))
    }

    pub(crate) fn combine_static(
        operator: &'static str,
        left: impl Into<Expr>,
        right: impl Into<Expr>,
    ) -> Expr {
        Expr::Binary(BinaryExpr::new(OperationSpec::from_static(operator), left, right))
    }

    /// View as a pipeline so further unary operators can be chained
    pub fn into_pipeline(self) -> Pipeline {
        match self {
            Expr::Pipeline(p) => p,
            Expr::Binary(b) => Pipeline::from(b),
        }
    }

    pub fn as_ref(&self) -> ExprRef<'_> {
        ExprRef::from(self)
    }

    pub fn is_bound(&self) -> bool {
        self.as_ref().is_bound()
    }

    /// Copy of the tree with every unbound leaf reading from `path`
    ///
    /// Bound subtrees are shared with the original, not copied.
    pub fn bind_unbound(&self, path: &str) -> Result<Expr, ValidationError> {
        validate_source(path)?;

        enum Step<'a> {
            Visit(&'a Expr),
            Bin(&'a BinaryExpr),
            FinishPipe(&'a Pipeline),
            FinishBin(&'a BinaryExpr),
        }

        // `None` marks a subtree that needed no change
        let mut built: Vec<Option<Expr>> = Vec::new();
        let mut steps = vec![Step::Visit(self)];

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(Expr::Pipeline(p)) => match &p.source {
                    Source::Unbound => built.push(Some(Expr::Pipeline(p.rebind(path)))),
                    Source::Path(_) => built.push(None),
                    Source::Combined(b) => {
                        steps.push(Step::FinishPipe(p));
                        steps.push(Step::Bin(b));
                    }
                },
                Step::Visit(Expr::Binary(b)) => steps.push(Step::Bin(b)),
                Step::Bin(b) => {
                    steps.push(Step::FinishBin(b));
                    steps.push(Step::Visit(&b.right));
                    steps.push(Step::Visit(&b.left));
                }
                Step::FinishPipe(p) => {
                    let inner = built.pop().flatten();
                    built.push(inner.map(|e| Expr::Pipeline(p.apply_to(&e.into_pipeline()))));
                }
                Step::FinishBin(b) => {
                    let right = built.pop().flatten();
                    let left = built.pop().flatten();
                    if left.is_none() && right.is_none() {
                        built.push(None);
                        continue;
                    }
                    let left = left.map(Arc::new).unwrap_or_else(|| Arc::clone(&b.left));
                    let right = right.map(Arc::new).unwrap_or_else(|| Arc::clone(&b.right));
                    built.push(Some(Expr::Binary(BinaryExpr::from_shared(
                        b.operator.clone(),
                        left,
                        right,
                    ))));
                }
            }
        }

        Ok(built.pop().flatten().unwrap_or_else(|| self.clone()))
    }
}

impl From<Pipeline> for Expr {
    fn from(p: Pipeline) -> Self {
        Expr::Pipeline(p)
    }
}

impl From<BinaryExpr> for Expr {
    fn from(b: BinaryExpr) -> Self {
        Expr::Binary(b)
    }
}

impl From<&Pipeline> for Expr {
    fn from(p: &Pipeline) -> Self {
        Expr::Pipeline(p.clone())
    }
}

/// Borrowed view of a tree root, accepted by the emitter
#[derive(Debug, Clone, Copy)]
pub enum ExprRef<'a> {
    Pipeline(&'a Pipeline),
    Binary(&'a BinaryExpr),
}

impl<'a> ExprRef<'a> {
    /// True when no leaf is `Source::Unbound`
    pub fn is_bound(self) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                ExprRef::Pipeline(p) => match &p.source {
                    Source::Unbound => return false,
                    Source::Path(_) => {}
                    Source::Combined(b) => pending.push(ExprRef::Binary(b)),
                },
                ExprRef::Binary(b) => {
                    pending.push(b.right().as_ref());
                    pending.push(b.left().as_ref());
                }
            }
        }
        true
    }
}

impl<'a> From<&'a Expr> for ExprRef<'a> {
    fn from(expr: &'a Expr) -> Self {
        match expr {
            Expr::Pipeline(p) => ExprRef::Pipeline(p),
            Expr::Binary(b) => ExprRef::Binary(b),
        }
    }
}

impl<'a> From<&'a Pipeline> for ExprRef<'a> {
    fn from(p: &'a Pipeline) -> Self {
        ExprRef::Pipeline(p)
    }
}

impl<'a> From<&'a BinaryExpr> for ExprRef<'a> {
    fn from(b: &'a BinaryExpr) -> Self {
        ExprRef::Binary(b)
    }
}
