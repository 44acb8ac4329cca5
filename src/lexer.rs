//! Tokenization of cdo command lines
//!
//! A command line is a flat sequence of whitespace separated tokens:
//! operators (`-name` or `-name,arg,...`) and plain words (files, option
//! values). Anything starting with `-` that is not a well-formed operator,
//! like `-1.5` or `--reduce_dim`, stays a word.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, multispace1, satisfy},
    combinator::{eof, map, opt, peek, recognize},
    multi::many0,
    sequence::{pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `-name[,arg...]`
    Operator { name: String, args: Vec<String> },
    /// A file path, option value or other bare word
    Word(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("Unexpected input at: {0}")]
    Unexpected(String),
    #[error("Empty operator argument in: {0}")]
    EmptyArgument(String),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Operator name: a letter followed by letters, digits or underscores
fn operator_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(is_name_char),
    ))(input)
}

/// Raw argument text after the first comma (split afterwards)
fn argument_list(input: &str) -> IResult<&str, &str> {
    preceded(char(','), take_while1(|c: char| !c.is_whitespace()))(input)
}

fn token_end(input: &str) -> IResult<&str, &str> {
    peek(alt((multispace1, eof)))(input)
}

/// `-name` or `-name,a,b`, ending at whitespace
fn operator(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    terminated(
        preceded(
            char('-'),
            pair(operator_name, opt(argument_list)),
        ),
        token_end,
    )(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

enum Raw<'a> {
    Operator(&'a str, Option<&'a str>),
    Word(&'a str),
}

fn raw_token(input: &str) -> IResult<&str, Raw<'_>> {
    preceded(
        multispace0,
        alt((
            map(operator, |(name, args)| Raw::Operator(name, args)),
            map(word, Raw::Word),
        )),
    )(input)
}

/// Tokenize a command line or expression fragment
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    let (remaining, raw) =
        many0(raw_token)(input).map_err(|e| LexError::Unexpected(format!("{:?}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(LexError::Unexpected(remaining.to_string()));
    }

    raw.into_iter()
        .map(|token| match token {
            Raw::Word(w) => Ok(Token::Word(w.to_string())),
            Raw::Operator(name, None) => Ok(Token::Operator {
                name: name.to_string(),
                args: Vec::new(),
            }),
            Raw::Operator(name, Some(list)) => {
                let args: Vec<String> = list.split(',').map(str::to_string).collect();
                if args.iter().any(String::is_empty) {
                    return Err(LexError::EmptyArgument(format!("-{},{}", name, list)));
                }
                Ok(Token::Operator {
                    name: name.to_string(),
                    args,
                })
            }
        })
        .collect()
}

/// Global options that consume the following word
const OPTIONS_WITH_VALUE: &[&str] = &["-f", "-P", "-b", "-z", "-k", "-t"];
/// Single-token global options
const FLAG_OPTIONS: &[&str] = &["-O", "-s", "-L", "-a", "-r", "-v", "-w", "-Q", "-V"];

/// First operator (or word) of a command, lowercased
///
/// Skips the `invocation` token when present and any global options, and
/// ignores a leading `-`. Returns `None` for an empty command.
pub fn leading_operator(command: &str, invocation: &str) -> Result<Option<String>, LexError> {
    let mut words = command.split_whitespace().peekable();
    if words.peek() == Some(&invocation) {
        words.next();
    }

    while let Some(word) = words.next() {
        if OPTIONS_WITH_VALUE.contains(&word) {
            words.next();
            continue;
        }
        if FLAG_OPTIONS.contains(&word) || word.starts_with("--") {
            continue;
        }
        let name = match lex(word)?.into_iter().next() {
            Some(Token::Operator { name, .. }) => name,
            Some(Token::Word(w)) => w
                .trim_start_matches('-')
                .split(',')
                .next()
                .unwrap_or_default()
                .to_string(),
            None => continue,
        };
        return Ok(Some(name.to_lowercase()));
    }
    Ok(None)
}
