//! Line scanning helpers shared by the concrete parsers

use std::str::FromStr;

use nom::{
    bytes::complete::take_till1,
    character::complete::char,
    combinator::rest,
    sequence::separated_pair,
    IResult,
};

use super::{ParseError, ParseErrorKind, EXCERPT_LIMIT};

/// One non-blank input line, trimmed, with its 1-based line number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// Progress lines the tool writes next to a report (`cdo    griddes: Processed ...`)
pub fn is_status_line(text: &str) -> bool {
    match text.strip_prefix("cdo") {
        Some(after) => {
            after.starts_with(|c: char| c.is_whitespace() || c == '(') && after.contains(':')
        }
        None => false,
    }
}

/// Non-blank, non-status lines
pub fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| Line {
            number: i + 1,
            text: raw.trim(),
        })
        .filter(|line| !line.text.is_empty() && !is_status_line(line.text))
}

/// Bounded excerpt for error messages
pub fn excerpt(text: &str) -> String {
    text.trim().chars().take(EXCERPT_LIMIT).collect()
}

fn key_value(sep: char, input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(move |c: char| c == sep), char(sep), rest)(input)
}

/// Split `key <sep> value` at the first separator, trimming both halves
pub fn split_key_value(text: &str, sep: char) -> Option<(&str, &str)> {
    let (_, (key, value)) = key_value(sep, text).ok()?;
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some((key, value.trim()))
    }
}

/// Strip one pair of matching single or double quotes
pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Block id from a comment like `# gridID 2` or `# zaxisID 1`
pub fn block_id(comment: &str) -> Option<u32> {
    let mut words = comment.trim_start_matches('#').split_whitespace();
    let label = words.next()?;
    let id = words.next()?;
    if words.next().is_some() || !label.ends_with("ID") {
        return None;
    }
    id.parse().ok()
}

/// Split on `:` only where it stands alone between whitespace (times like
/// `00:00:00` stay intact)
pub fn sections(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b != b':' {
            continue;
        }
        let before = i == 0 || bytes[i - 1].is_ascii_whitespace();
        let after = i + 1 == bytes.len() || bytes[i + 1].is_ascii_whitespace();
        if before && after {
            out.push(text[start..i].trim());
            start = i + 1;
        }
    }
    out.push(text[start..].trim());
    out
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
    line: usize,
}

/// Key/value pairs of one block, with typed accessors
#[derive(Debug, Clone)]
pub struct Fields {
    /// Block id from its `# ...ID n` comment, or its 1-based position
    pub id: u32,
    /// Line the block starts on
    pub line: usize,
    expected: &'static str,
    entries: Vec<Entry>,
}

impl Fields {
    pub fn new(id: u32, line: usize, expected: &'static str) -> Self {
        Fields {
            id,
            line,
            expected,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, key: &str, value: &str, line: usize) {
        self.entries.push(Entry {
            key: key.to_string(),
            value: value.to_string(),
            line,
        });
    }

    fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    fn invalid(&self, entry: &Entry) -> ParseError {
        ParseError::new(
            ParseErrorKind::InvalidValue {
                field: entry.key.clone(),
                value: entry.value.clone(),
            },
            self.expected,
            &format!("{} = {}", entry.key, entry.value),
            Some(entry.line),
        )
    }

    /// Unquoted text value
    pub fn text(&self, key: &str) -> Option<String> {
        self.entry(key).map(|e| unquote(&e.value).to_string())
    }

    pub fn required_text(&self, key: &str) -> Result<String, ParseError> {
        self.text(key).ok_or_else(|| self.missing(key))
    }

    pub fn optional<T: FromStr>(&self, key: &str) -> Result<Option<T>, ParseError> {
        match self.entry(key) {
            None => Ok(None),
            Some(e) => unquote(&e.value)
                .parse()
                .map(Some)
                .map_err(|_| self.invalid(e)),
        }
    }

    pub fn required<T: FromStr>(&self, key: &str) -> Result<T, ParseError> {
        self.optional(key)?.ok_or_else(|| self.missing(key))
    }

    /// Whitespace separated numbers; empty when the key is absent
    pub fn floats(&self, key: &str) -> Result<Vec<f64>, ParseError> {
        match self.entry(key) {
            None => Ok(Vec::new()),
            Some(e) => e
                .value
                .split_whitespace()
                .map(|v| v.parse::<f64>().map_err(|_| self.invalid(e)))
                .collect(),
        }
    }

    /// Entries whose key is not in `known`, in input order
    pub fn extras(&self, known: &[&str]) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter(|e| !known.contains(&e.key.as_str()))
            .map(|e| (e.key.clone(), unquote(&e.value).to_string()))
            .collect()
    }

    fn missing(&self, key: &str) -> ParseError {
        ParseError::new(
            ParseErrorKind::MissingField(key.to_string()),
            self.expected,
            &format!("block {} starting at line {}", self.id, self.line),
            Some(self.line),
        )
    }

    fn append(&mut self, line: &Line<'_>) -> bool {
        let numeric = line.text.split_whitespace().all(|t| t.parse::<f64>().is_ok());
        match self.entries.last_mut() {
            Some(last) if numeric => {
                last.value.push(' ');
                last.value.push_str(line.text);
                true
            }
            _ => false,
        }
    }
}

/// Split `key = value` text into blocks, each opened by `start_key`
///
/// Numeric lines without `=` continue the previous value (long coordinate
/// arrays wrap). Text before the first `start_key` is an error.
pub fn key_value_blocks(
    text: &str,
    start_key: &str,
    expected: &'static str,
) -> Result<Vec<Fields>, ParseError> {
    let mut blocks: Vec<Fields> = Vec::new();
    let mut current: Option<Fields> = None;
    let mut pending_id = None;

    for line in lines(text) {
        if line.text.starts_with('#') {
            if let Some(id) = block_id(line.text) {
                pending_id = Some(id);
            }
            continue;
        }

        let pair = split_key_value(line.text, '=').filter(|(key, _)| !key.contains(char::is_whitespace));
        if let Some((key, value)) = pair {
            if key == start_key {
                blocks.extend(current.take());
                let ordinal = blocks.len() as u32 + 1;
                let mut fields = Fields::new(pending_id.take().unwrap_or(ordinal), line.number, expected);
                fields.push(key, value, line.number);
                log::trace!("{}: block {} at line {}", expected, fields.id, line.number);
                current = Some(fields);
                continue;
            }
        }

        match (pair, current.as_mut()) {
            (Some((key, value)), Some(fields)) => fields.push(key, value, line.number),
            (None, Some(fields)) => {
                if !fields.append(&line) {
                    return Err(ParseError::unexpected(expected, &line));
                }
            }
            (_, None) => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingField(start_key.to_string()),
                    expected,
                    line.text,
                    Some(line.number),
                ))
            }
        }
    }

    blocks.extend(current);
    if blocks.is_empty() {
        return Err(ParseError::missing(start_key, expected, text));
    }
    Ok(blocks)
}

/// Column layout read from a `-1 : ... : Label` header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Column names per `:` separated group
    pub groups: Vec<Vec<String>>,
    /// Title of the trailing free-text column
    pub label: String,
}

/// One data row matched against a schema
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub line: Line<'a>,
    pub index: &'a str,
    pub cells: Vec<&'a str>,
    pub label: &'a str,
}

impl TableSchema {
    pub fn is_header(text: &str) -> bool {
        sections(text).first() == Some(&"-1")
    }

    pub fn from_header(line: &Line<'_>, expected: &str) -> Result<Self, ParseError> {
        let parts = sections(line.text);
        if parts.len() < 3 || parts[0] != "-1" {
            return Err(ParseError::unexpected(expected, line));
        }
        let last = parts.len() - 1;
        let groups = parts[1..last]
            .iter()
            .map(|group| group.split_whitespace().map(str::to_string).collect())
            .collect();
        Ok(TableSchema {
            groups,
            label: parts[last].to_string(),
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.groups.iter().flatten().map(String::as_str)
    }

    /// Every position of `column` (headers may repeat a name)
    pub fn positions(&self, column: &str) -> Vec<usize> {
        self.columns()
            .enumerate()
            .filter(|(_, c)| *c == column)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns().position(|c| c == column)
    }

    /// Match a data line against the schema; group sizes must agree
    pub fn row<'a>(&self, line: &Line<'a>, expected: &str) -> Result<Row<'a>, ParseError> {
        let parts = sections(line.text);
        if parts.len() != self.groups.len() + 2 {
            return Err(ParseError::unexpected(expected, line));
        }
        let mut cells = Vec::new();
        for (group, part) in self.groups.iter().zip(&parts[1..]) {
            let values: Vec<&str> = part.split_whitespace().collect();
            if values.len() != group.len() {
                return Err(ParseError::unexpected(expected, line));
            }
            cells.extend(values);
        }
        Ok(Row {
            line: *line,
            index: parts[0],
            cells,
            label: parts[parts.len() - 1],
        })
    }

    /// Require a column in the header
    pub fn require(&self, column: &str, expected: &str, header: &Line<'_>) -> Result<usize, ParseError> {
        self.position(column).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::MissingField(column.to_string()),
                expected,
                header.text,
                Some(header.number),
            )
        })
    }
}

impl<'a> Row<'a> {
    /// Convert the cell at `position`
    pub fn get<T: FromStr>(&self, position: usize, column: &str, expected: &str) -> Result<T, ParseError> {
        let cell = self.cells.get(position).copied().unwrap_or_default();
        cell.parse()
            .map_err(|_| ParseError::invalid(column, cell, expected, &self.line))
    }

    /// Convert the cell at an optional position
    pub fn get_opt<T: FromStr>(
        &self,
        position: Option<usize>,
        column: &str,
        expected: &str,
    ) -> Result<Option<T>, ParseError> {
        position.map(|p| self.get(p, column, expected)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines_are_skipped() {
        let text = "\n  gridtype = lonlat\ncdo    griddes: Processed 1 variable [0.02s 44MB]\n";
        let collected: Vec<Line<'_>> = lines(text).collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].number, 2);
        assert!(!is_status_line("cdo_var = 1"));
        assert!(is_status_line("cdo(1) sinfo: Processed"));
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(split_key_value("xname = lon", '='), Some(("xname", "lon")));
        assert_eq!(split_key_value("File format : NetCDF4", ':'), Some(("File format", "NetCDF4")));
        assert_eq!(split_key_value("a = b = c", '='), Some(("a", "b = c")));
        assert_eq!(split_key_value("= x", '='), None);
        assert_eq!(split_key_value("no separator", '='), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"degrees_east\""), "degrees_east");
        assert_eq!(unquote("'single'"), "single");
        assert_eq!(unquote("\"unbalanced"), "\"unbalanced");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_block_id() {
        assert_eq!(block_id("# gridID 2"), Some(2));
        assert_eq!(block_id("# zaxisID 1"), Some(1));
        assert_eq!(block_id("#"), None);
        assert_eq!(block_id("# Grid description"), None);
    }

    #[test]
    fn test_sections_keep_times() {
        let parts = sections("1 : 2020-01-01 00:00:00  0 F64 : tas");
        assert_eq!(parts, vec!["1", "2020-01-01 00:00:00  0 F64", "tas"]);
        assert_eq!(sections("Grid coordinates :"), vec!["Grid coordinates", ""]);
    }

    #[test]
    fn test_blocks_with_continuation() {
        let text = "# gridID 3\ngridtype = generic\ngridsize = 4\nxvals = 1 2\n  3 4\n";
        let blocks = key_value_blocks(text, "gridtype", "griddes").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, 3);
        assert_eq!(blocks[0].floats("xvals").unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_blocks_require_start_key() {
        let err = key_value_blocks("size = 1\n", "zaxistype", "zaxisdes").unwrap_err();
        assert_eq!(err.missing_field(), Some("zaxistype"));
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_blocks_reject_stray_text() {
        let err = key_value_blocks("gridtype = lonlat\nnot a field\n", "gridtype", "griddes").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedLine);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_field_conversion_errors() {
        let blocks = key_value_blocks("gridtype = lonlat\ngridsize = many\n", "gridtype", "griddes").unwrap();
        let err = blocks[0].required::<u64>("gridsize").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidValue {
                field: "gridsize".into(),
                value: "many".into()
            }
        );
        assert_eq!(blocks[0].required::<u64>("xsize").unwrap_err().missing_field(), Some("xsize"));
    }

    #[test]
    fn test_schema_rows() {
        let header = Line {
            number: 1,
            text: "-1 : Date Time Level : Parameter name",
        };
        let schema = TableSchema::from_header(&header, "table").unwrap();
        assert_eq!(schema.label, "Parameter name");
        assert_eq!(schema.position("Level"), Some(2));

        let good = Line {
            number: 2,
            text: "1 : 2020-01-01 00:00:00 0 : tas",
        };
        let row = schema.row(&good, "table").unwrap();
        assert_eq!(row.cells, vec!["2020-01-01", "00:00:00", "0"]);
        assert_eq!(row.label, "tas");
        assert_eq!(row.get::<i32>(2, "Level", "table").unwrap(), 0);

        let short = Line {
            number: 3,
            text: "2 : 2020-01-01 0 : tas",
        };
        assert!(schema.row(&short, "table").is_err());
    }
}
