//! Parameter tables (`partab`, `codetab`) and variable lists (`vlist`)

use serde::Serialize;

use super::scan::{lines, split_key_value, unquote, Line};
use super::{ParseError, ParseErrorKind, Parser};

const NAMELIST_SHAPE: &str = "parameter namelist (&parameter ... /)";
const TABLE_SHAPE: &str = "parameter table (code | name | units | description)";
const VLIST_SHAPE: &str = "variable list lines";

/// One parameter of a parameter table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterEntry {
    pub code: Option<i64>,
    pub name: String,
    pub units: Option<String>,
    pub description: Option<String>,
    pub standard_name: Option<String>,
    /// Other namelist keys, in input order
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterTable {
    pub entries: Vec<ParameterEntry>,
}

impl ParameterTable {
    pub fn by_name(&self, name: &str) -> Option<&ParameterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn by_code(&self, code: i64) -> Option<&ParameterEntry> {
        self.entries.iter().find(|e| e.code == Some(code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Block<'a> {
    start: Line<'a>,
    pairs: Vec<(&'a str, &'a str, Line<'a>)>,
}

impl<'a> Block<'a> {
    fn finish(self) -> Result<ParameterEntry, ParseError> {
        let mut entry = ParameterEntry {
            code: None,
            name: String::new(),
            units: None,
            description: None,
            standard_name: None,
            extra: Vec::new(),
        };
        for (key, value, line) in self.pairs {
            let value = unquote(value);
            match key {
                "name" | "out_name" if entry.name.is_empty() => entry.name = value.to_string(),
                "code" | "param" => {
                    let code = value
                        .parse()
                        .map_err(|_| ParseError::invalid(key, value, NAMELIST_SHAPE, &line))?;
                    entry.code = Some(code);
                }
                "units" => entry.units = Some(value.to_string()),
                "long_name" => entry.description = Some(value.to_string()),
                "standard_name" => entry.standard_name = Some(value.to_string()),
                _ => entry.extra.push((key.to_string(), value.to_string())),
            }
        }
        if entry.name.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::MissingField("name".into()),
                NAMELIST_SHAPE,
                self.start.text,
                Some(self.start.number),
            ));
        }
        Ok(entry)
    }
}

/// `partab` namelist output
#[derive(Debug, Clone, Copy, Default)]
pub struct PartabNamelistParser;

impl Parser for PartabNamelistParser {
    type Output = ParameterTable;

    fn shape(&self) -> &'static str {
        NAMELIST_SHAPE
    }

    fn parse(&self, text: &str) -> Result<ParameterTable, ParseError> {
        let mut entries = Vec::new();
        let mut block: Option<Block<'_>> = None;

        for line in lines(text) {
            if line.text.starts_with('#') {
                continue;
            }
            if line.text.starts_with("&parameter") {
                if block.is_some() {
                    return Err(ParseError::unexpected(NAMELIST_SHAPE, &line));
                }
                block = Some(Block {
                    start: line,
                    pairs: Vec::new(),
                });
                continue;
            }
            if line.text == "/" {
                match block.take() {
                    Some(done) => entries.push(done.finish()?),
                    None => return Err(ParseError::unexpected(NAMELIST_SHAPE, &line)),
                }
                continue;
            }
            match (block.as_mut(), split_key_value(line.text, '=')) {
                (Some(open), Some((key, value))) => open.pairs.push((key, value, line)),
                _ => return Err(ParseError::unexpected(NAMELIST_SHAPE, &line)),
            }
        }

        if let Some(open) = block {
            return Err(ParseError::new(
                ParseErrorKind::MissingField("/".into()),
                NAMELIST_SHAPE,
                open.start.text,
                Some(open.start.number),
            ));
        }
        Ok(ParameterTable { entries })
    }
}

/// `codetab` style rows, `|` separated or whitespace separated
#[derive(Debug, Clone, Copy, Default)]
pub struct PartabTableParser;

impl Parser for PartabTableParser {
    type Output = ParameterTable;

    fn shape(&self) -> &'static str {
        TABLE_SHAPE
    }

    fn parse(&self, text: &str) -> Result<ParameterTable, ParseError> {
        let mut entries = Vec::new();

        for line in lines(text) {
            if line.text.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = if line.text.contains('|') {
                line.text.split('|').map(str::trim).collect()
            } else {
                line.text.split_whitespace().collect()
            };
            let (code, name) = match parts.as_slice() {
                [code, name, ..] if !name.is_empty() => (*code, *name),
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingField("name".into()),
                        TABLE_SHAPE,
                        line.text,
                        Some(line.number),
                    ))
                }
            };
            let code = code
                .parse()
                .map_err(|_| ParseError::invalid("code", code, TABLE_SHAPE, &line))?;
            let description = (parts.len() > 3).then(|| parts[3..].join(" "));
            entries.push(ParameterEntry {
                code: Some(code),
                name: name.to_string(),
                units: parts.get(2).filter(|u| !u.is_empty()).map(|u| u.to_string()),
                description,
                standard_name: None,
                extra: Vec::new(),
            });
        }

        Ok(ParameterTable { entries })
    }
}

/// One `vlist` line, kept raw with its tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlistEntry {
    pub raw: String,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlistReport {
    pub entries: Vec<VlistEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VlistParser;

impl Parser for VlistParser {
    type Output = VlistReport;

    fn shape(&self) -> &'static str {
        VLIST_SHAPE
    }

    fn parse(&self, text: &str) -> Result<VlistReport, ParseError> {
        let entries = lines(text)
            .filter(|line| !line.text.starts_with('#'))
            .map(|line| VlistEntry {
                raw: line.text.to_string(),
                parts: line.text.split_whitespace().map(str::to_string).collect(),
            })
            .collect();
        Ok(VlistReport { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMELIST: &str = r#"
&parameter
  name = tas
  code = 167
  standard_name = air_temperature
  long_name = "Near-Surface Air Temperature"
  units = "K"
  cell_methods = "time: mean"
/
&parameter
  name = pr
  units = "kg m-2 s-1"
/
"#;

    #[test]
    fn namelist_blocks() {
        let table = PartabNamelistParser.parse(NAMELIST).unwrap();
        assert_eq!(table.len(), 2);
        let tas = table.by_code(167).unwrap();
        assert_eq!(tas.name, "tas");
        assert_eq!(tas.description.as_deref(), Some("Near-Surface Air Temperature"));
        assert_eq!(tas.extra, vec![("cell_methods".to_string(), "time: mean".to_string())]);
        assert_eq!(table.by_name("pr").unwrap().units.as_deref(), Some("kg m-2 s-1"));
    }

    #[test]
    fn namelist_requires_name() {
        let err = PartabNamelistParser.parse("&parameter\n units = K\n/\n").unwrap_err();
        assert_eq!(err.missing_field(), Some("name"));
    }

    #[test]
    fn namelist_requires_terminator() {
        let err = PartabNamelistParser.parse("&parameter\n name = tas\n").unwrap_err();
        assert_eq!(err.missing_field(), Some("/"));
    }

    #[test]
    fn table_rejects_bad_code() {
        let err = PartabTableParser.parse("x | tas | K\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn vlist_keeps_raw_lines() {
        let report = VlistParser.parse("# header\ntemperature 500 hPa\n").unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].parts, vec!["temperature", "500", "hPa"]);
    }
}
