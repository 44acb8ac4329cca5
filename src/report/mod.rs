//! Report parsing framework
//!
//! Every printing operator of the tool emits one of a few loose text shapes:
//! key/value blocks, header-described tables, free lists. Each concrete
//! parser here is a forward-only scanner over one shape that produces an
//! immutable record, or a `ParseError` naming what it expected.
//!
//! Parsers are stateless, so one instance can be shared across threads.

mod attributes;
mod grid;
mod registry;
pub mod scan;
mod sinfo;
mod tables;
mod timeline;
mod values;
mod version;

pub use attributes::{
    Attribute, AttributeReport, GlobalAttributes, ShowattsParser, ShowattsglobParser,
    VariableAttributes,
};
pub use grid::{GridInfo, GridReport, GriddesParser, ZaxisInfo, ZaxisReport, ZaxisdesParser};
pub use registry::ParserRegistry;
pub use sinfo::{
    DatasetInfo, GridSummary, InfoEntry, InfoTable, InfoTableParser, Level, SinfoParser,
    TimeAxis, VariableEntry, ZaxisSummary,
};
pub use tables::{
    ParameterEntry, ParameterTable, PartabNamelistParser, PartabTableParser, VlistEntry,
    VlistParser, VlistReport,
};
pub use timeline::{infer_step, TimeStep, Timeline, TimelineParser};
pub use values::{Count, CountParser, NameList, NamesParser, VctParser, VerticalCoordinateTable};
pub use version::{ToolVersion, VersionParser};

use serde::Serialize;
use std::fmt;

/// Longest raw-text excerpt carried by a `ParseError`
pub const EXCERPT_LIMIT: usize = 80;

/// A pure text-to-record conversion for one report shape
pub trait Parser: Send + Sync {
    type Output;

    /// Human readable description of the accepted shape
    fn shape(&self) -> &'static str;

    fn parse(&self, text: &str) -> Result<Self::Output, ParseError>;
}

/// Object-safe view of a `Parser` whose output converts into `Report`
pub trait ReportParser: Send + Sync {
    fn shape(&self) -> &'static str;

    fn parse_report(&self, text: &str) -> Result<Report, ParseError>;
}

impl<P> ReportParser for P
where
    P: Parser,
    P::Output: Into<Report>,
{
    fn shape(&self) -> &'static str {
        Parser::shape(self)
    }

    fn parse_report(&self, text: &str) -> Result<Report, ParseError> {
        self.parse(text).map(Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A required label or section never appeared
    MissingField(String),
    /// A label was present but its value did not convert
    InvalidValue { field: String, value: String },
    /// A line that fits no rule at the current position
    UnexpectedLine,
    /// Nothing but blank or status lines
    Empty,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::MissingField(field) => write!(f, "missing required field '{}'", field),
            ParseErrorKind::InvalidValue { field, value } => {
                write!(f, "invalid value '{}' for '{}'", value, field)
            }
            ParseErrorKind::UnexpectedLine => f.write_str("unexpected line"),
            ParseErrorKind::Empty => f.write_str("no content"),
        }
    }
}

/// Raw text did not match the shape of its report kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Shape the parser was looking for
    pub expected: String,
    /// Offending text, at most `EXCERPT_LIMIT` characters
    pub excerpt: String,
    /// 1-based line number, when the failure is tied to one line
    pub line: Option<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} while parsing {}", self.kind, self.expected)?;
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }
        write!(f, " near '{}'", self.excerpt)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn new(kind: ParseErrorKind, expected: &str, excerpt: &str, line: Option<usize>) -> Self {
        ParseError {
            kind,
            expected: expected.to_string(),
            excerpt: scan::excerpt(excerpt),
            line,
        }
    }

    pub fn missing(field: &str, expected: &str, text: &str) -> Self {
        Self::new(ParseErrorKind::MissingField(field.to_string()), expected, text, None)
    }

    pub fn invalid(field: &str, value: &str, expected: &str, line: &scan::Line<'_>) -> Self {
        Self::new(
            ParseErrorKind::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
            },
            expected,
            line.text,
            Some(line.number),
        )
    }

    pub fn unexpected(expected: &str, line: &scan::Line<'_>) -> Self {
        Self::new(ParseErrorKind::UnexpectedLine, expected, line.text, Some(line.number))
    }

    pub fn empty(expected: &str) -> Self {
        Self::new(ParseErrorKind::Empty, expected, "", None)
    }

    /// Name of the missing field, if that is what failed
    pub fn missing_field(&self) -> Option<&str> {
        match &self.kind {
            ParseErrorKind::MissingField(field) => Some(field),
            _ => None,
        }
    }
}

/// Any parsed report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Grids(GridReport),
    Zaxes(ZaxisReport),
    Dataset(DatasetInfo),
    Info(InfoTable),
    Vlist(VlistReport),
    Attributes(AttributeReport),
    GlobalAttributes(GlobalAttributes),
    Parameters(ParameterTable),
    Vct(VerticalCoordinateTable),
    Names(NameList),
    Timeline(Timeline),
    Count(Count),
    Version(ToolVersion),
}

impl Report {
    /// JSON rendering of the record
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

macro_rules! report_variants {
    ($($variant:ident => $record:ty),* $(,)?) => {
        $(
            impl From<$record> for Report {
                fn from(record: $record) -> Self {
                    Report::$variant(record)
                }
            }

            impl TryFrom<Report> for $record {
                type Error = Report;

                fn try_from(report: Report) -> Result<Self, Report> {
                    match report {
                        Report::$variant(record) => Ok(record),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

report_variants! {
    Grids => GridReport,
    Zaxes => ZaxisReport,
    Dataset => DatasetInfo,
    Info => InfoTable,
    Vlist => VlistReport,
    Attributes => AttributeReport,
    GlobalAttributes => GlobalAttributes,
    Parameters => ParameterTable,
    Vct => VerticalCoordinateTable,
    Names => NameList,
    Timeline => Timeline,
    Count => Count,
    Version => ToolVersion,
}
