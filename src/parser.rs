//! Reads a serialized expression fragment back into an `Expr`
//!
//! The fragment grammar is prefix notation with fixed arity per operator,
//! so it is read left to right with a stack of operators still waiting
//! for their inputs.

use crate::ast::{Arg, BinaryExpr, Expr, OperationSpec, Pipeline};
use crate::error::ValidationError;
use crate::lexer::{lex, LexError, Token};
use crate::operators;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),
    #[error("Unexpected trailing token: {0}")]
    TrailingToken(String),
    #[error("Empty input")]
    EmptyInput,
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

struct Pending {
    name: String,
    args: Vec<Arg>,
    arity: usize,
    inputs: Vec<Expr>,
}

impl Pending {
    fn build(self) -> Result<Expr, GrammarError> {
        let Pending { name, args, inputs, .. } = self;
        let mut inputs = inputs.into_iter();
        match (inputs.next(), inputs.next()) {
            (Some(left), Some(right)) => {
                let op = OperationSpec::new(name, args)?;
                Ok(Expr::Binary(BinaryExpr::new(op, left, right)))
            }
            (Some(input), None) => Ok(Expr::Pipeline(
                input.into_pipeline().with_operation(&name, args)?,
            )),
            _ => Err(GrammarError::UnexpectedEof(format!("input for '-{}'", name))),
        }
    }
}

/// Fragment reader state
pub struct FragmentReader<F> {
    tokens: Vec<Token>,
    pos: usize,
    arity: F,
}

impl<F: Fn(&str) -> usize> FragmentReader<F> {
    pub fn new(tokens: Vec<Token>, arity: F) -> Self {
        FragmentReader {
            tokens,
            pos: 0,
            arity,
        }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consume and return the current token
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Read one complete expression
    pub fn read_expr(&mut self) -> Result<Expr, GrammarError> {
        let mut stack: Vec<Pending> = Vec::new();

        loop {
            let token = match self.advance() {
                Some(token) => token,
                None => {
                    return Err(match stack.last() {
                        Some(top) => GrammarError::UnexpectedEof(format!("input for '-{}'", top.name)),
                        None => GrammarError::EmptyInput,
                    })
                }
            };

            let mut value = match token {
                Token::Operator { name, args } => {
                    let arity = (self.arity)(&name);
                    stack.push(Pending {
                        args: args.iter().map(|a| Arg::from_token(a)).collect(),
                        name,
                        arity,
                        inputs: Vec::with_capacity(arity),
                    });
                    continue;
                }
                Token::Word(source) => Expr::Pipeline(Pipeline::bind(source)),
            };

            // Feed the finished value upward until an operator still needs input
            loop {
                match stack.last_mut() {
                    None => return Ok(value),
                    Some(top) => {
                        top.inputs.push(value);
                        if top.inputs.len() < top.arity {
                            break;
                        }
                    }
                }
                match stack.pop() {
                    Some(done) => value = done.build()?,
                    None => return Err(GrammarError::EmptyInput),
                }
            }
        }
    }

    /// Read one expression and require that nothing follows it
    pub fn read_all(&mut self) -> Result<Expr, GrammarError> {
        if self.peek().is_none() {
            return Err(GrammarError::EmptyInput);
        }
        let expr = self.read_expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(Token::Word(w)) => Err(GrammarError::TrailingToken(w.clone())),
            Some(Token::Operator { name, .. }) => Err(GrammarError::TrailingToken(format!("-{}", name))),
        }
    }
}

/// Parse a fragment using the operator catalog's arity table
pub fn parse_fragment(fragment: &str) -> Result<Expr, GrammarError> {
    parse_fragment_with(fragment, operators::input_arity)
}

/// Parse a fragment with a caller-provided arity table
pub fn parse_fragment_with<F: Fn(&str) -> usize>(fragment: &str, arity: F) -> Result<Expr, GrammarError> {
    let tokens = lex(fragment)?;
    FragmentReader::new(tokens, arity).read_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::emit_fragment;

    fn round_trip(fragment: &str) -> String {
        emit_fragment(&parse_fragment(fragment).unwrap()).unwrap()
    }

    #[test]
    fn parse_source_only() {
        assert_eq!(parse_fragment("data.nc").unwrap(), Expr::Pipeline(Pipeline::bind("data.nc")));
    }

    #[test]
    fn parse_unary_chain() {
        let expr = parse_fragment("-yearmean -selname,tas data.nc").unwrap();
        let p = expr.into_pipeline();
        let names: Vec<&str> = p.operations().iter().map(|op| op.name()).collect();
        assert_eq!(names, vec!["selname", "yearmean"]);
    }

    #[test]
    fn parse_binary_round_trip() {
        for fragment in [
            "-sub -yearmean a.nc b.nc",
            "-fldmean -sub a.nc -timmean b.nc",
            "-add -sub a.nc b.nc -mul c.nc d.nc",
            "-sellonlatbox,-10,40.5,30,70 in.nc",
        ] {
            assert_eq!(round_trip(fragment), fragment);
        }
    }

    #[test]
    fn parse_missing_input() {
        assert_eq!(
            parse_fragment("-sub a.nc"),
            Err(GrammarError::UnexpectedEof("input for '-sub'".into()))
        );
        assert!(matches!(parse_fragment("-yearmean"), Err(GrammarError::UnexpectedEof(_))));
    }

    #[test]
    fn parse_trailing_tokens() {
        assert_eq!(
            parse_fragment("a.nc b.nc"),
            Err(GrammarError::TrailingToken("b.nc".into()))
        );
    }

    #[test]
    fn parse_empty() {
        assert_eq!(parse_fragment("  "), Err(GrammarError::EmptyInput));
    }

    #[test]
    fn parse_applies_catalog_rules() {
        assert!(matches!(
            parse_fragment("-sellonlatbox,1,2 in.nc"),
            Err(GrammarError::Invalid(_))
        ));
    }

    #[test]
    fn parse_with_custom_arity() {
        let expr = parse_fragment_with("-merge a.nc b.nc", |name| if name == "merge" { 2 } else { 1 }).unwrap();
        assert!(matches!(expr, Expr::Binary(_)));
    }
}
