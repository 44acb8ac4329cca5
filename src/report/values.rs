//! Plain value listings: vertical coordinate tables, name lists, counts

use serde::Serialize;

use super::scan::lines;
use super::{ParseError, ParseErrorKind, Parser};

const VCT_SHAPE: &str = "vertical coordinate table (numbers, or I vct_a vct_b rows)";
const NAMES_SHAPE: &str = "whitespace separated names";
const COUNT_SHAPE: &str = "a single integer";

/// Hybrid level coefficients, `a` half first then `b` half
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticalCoordinateTable {
    pub values: Vec<f64>,
}

impl VerticalCoordinateTable {
    pub fn a(&self) -> &[f64] {
        &self.values[..self.values.len() / 2]
    }

    pub fn b(&self) -> &[f64] {
        &self.values[self.values.len() / 2..]
    }

    /// Number of level interfaces described by the table
    pub fn interfaces(&self) -> usize {
        self.values.len() / 2
    }
}

/// Accepts a flat list of coefficients or `index a b` rows
#[derive(Debug, Clone, Copy, Default)]
pub struct VctParser;

impl Parser for VctParser {
    type Output = VerticalCoordinateTable;

    fn shape(&self) -> &'static str {
        VCT_SHAPE
    }

    fn parse(&self, text: &str) -> Result<VerticalCoordinateTable, ParseError> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for line in lines(text).filter(|l| !l.text.starts_with('#')) {
            let row = line
                .text
                .split_whitespace()
                .map(|t| t.parse::<f64>().map_err(|_| ParseError::invalid("vct", t, VCT_SHAPE, &line)))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(ParseError::empty(VCT_SHAPE));
        }

        let indexed = rows
            .iter()
            .enumerate()
            .all(|(i, row)| row.len() == 3 && row[0] == i as f64);
        let values = if indexed {
            let (a, b): (Vec<f64>, Vec<f64>) = rows.iter().map(|row| (row[1], row[2])).unzip();
            a.into_iter().chain(b).collect()
        } else {
            rows.into_iter().flatten().collect::<Vec<f64>>()
        };
        if values.len() % 2 != 0 {
            return Err(ParseError::new(
                ParseErrorKind::InvalidValue {
                    field: "vct".to_string(),
                    value: format!("{} coefficients", values.len()),
                },
                VCT_SHAPE,
                text,
                None,
            ));
        }
        Ok(VerticalCoordinateTable { values })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameList {
    pub names: Vec<String>,
}

impl NameList {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// `showname`, `showvar` and similar
#[derive(Debug, Clone, Copy, Default)]
pub struct NamesParser;

impl Parser for NamesParser {
    type Output = NameList;

    fn shape(&self) -> &'static str {
        NAMES_SHAPE
    }

    fn parse(&self, text: &str) -> Result<NameList, ParseError> {
        let names = lines(text)
            .flat_map(|line| line.text.split_whitespace())
            .map(str::to_string)
            .collect();
        Ok(NameList { names })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Count {
    pub value: u64,
}

/// `ntime`, `nvar`, `nlevel` and other counters
#[derive(Debug, Clone, Copy, Default)]
pub struct CountParser;

impl Parser for CountParser {
    type Output = Count;

    fn shape(&self) -> &'static str {
        COUNT_SHAPE
    }

    fn parse(&self, text: &str) -> Result<Count, ParseError> {
        let mut found = lines(text);
        let line = found.next().ok_or_else(|| ParseError::empty(COUNT_SHAPE))?;
        if let Some(extra) = found.next() {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedLine,
                COUNT_SHAPE,
                extra.text,
                Some(extra.number),
            ));
        }
        let value = line
            .text
            .parse()
            .map_err(|_| ParseError::invalid("count", line.text, COUNT_SHAPE, &line))?;
        Ok(Count { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vct_indexed_rows() {
        let text = "#   I    vct_a(I)      vct_b(I)\n    0    0    0\n    1    2000.5    0\n    2    0    1\n";
        let vct = VctParser.parse(text).unwrap();
        assert_eq!(vct.a(), &[0.0, 2000.5, 0.0]);
        assert_eq!(vct.b(), &[0.0, 0.0, 1.0]);
        assert_eq!(vct.interfaces(), 3);
    }

    #[test]
    fn vct_rejects_text() {
        assert!(VctParser.parse("0.0 abc").is_err());
        assert_eq!(VctParser.parse("\n").unwrap_err().kind, ParseErrorKind::Empty);
    }

    #[test]
    fn vct_flat_list_splits_in_halves() {
        let vct = VctParser.parse("0 100 200\n0.5 0.8 1\n").unwrap();
        assert_eq!(vct.a(), &[0.0, 100.0, 200.0]);
        assert_eq!(vct.b(), &[0.5, 0.8, 1.0]);
    }

    #[test]
    fn vct_rejects_odd_count() {
        let err = VctParser.parse("0 100 200\n0.5 1\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidValue {
                field: "vct".into(),
                value: "5 coefficients".into()
            }
        );
    }

    #[test]
    fn names_across_lines() {
        let list = NamesParser.parse(" tas pr\n uas\ncdo    showname: Processed 3 variables\n").unwrap();
        assert_eq!(list.names, vec!["tas", "pr", "uas"]);
        assert!(list.contains("uas"));
    }

    #[test]
    fn count_single_value() {
        assert_eq!(CountParser.parse("  365\n").unwrap().value, 365);
        assert!(CountParser.parse("12\n13\n").is_err());
        assert!(CountParser.parse("twelve").is_err());
    }
}
