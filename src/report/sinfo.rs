//! Dataset overviews: `sinfo` (per variable) and `info` (per record)

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::scan::{lines, sections, split_key_value, Line, TableSchema};
use super::timeline::{infer_step, timestamps_on, TimeStep};
use super::{ParseError, ParseErrorKind, Parser};

const SINFO_SHAPE: &str = "sinfo report (File format, variable table, coordinate sections)";
const INFO_SHAPE: &str = "info table (-1 : Date Time Level Gridsize ... : Parameter)";

/// One row of the `sinfo` variable table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableEntry {
    pub index: u32,
    pub institute: Option<String>,
    pub source: Option<String>,
    /// `c` for constant, `v` for time varying
    pub time_type: Option<String>,
    pub step_type: Option<String>,
    pub levels: u32,
    /// Vertical axis number (first `Num` column)
    pub zaxis: u32,
    pub points: u64,
    /// Grid number (second `Num` column)
    pub grid: u32,
    pub dtype: String,
    /// Name, code or id, depending on the report flavor
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    pub index: u32,
    pub gridtype: String,
    pub points: Option<u64>,
    /// `(135x129)` as `[135, 129]`
    pub dims: Vec<u64>,
    /// Coordinate lines such as `longitude : 0 to 359 by 1 degrees_east`
    pub details: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZaxisSummary {
    pub index: u32,
    pub zaxistype: String,
    pub levels: Option<u32>,
    pub details: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeAxis {
    pub steps: Option<u64>,
    pub ref_time: Option<NaiveDateTime>,
    pub units: Option<String>,
    pub calendar: Option<String>,
    pub timestamps: Vec<NaiveDateTime>,
    /// Position of the `....` gap when the listing was shortened
    pub truncated_at: Option<usize>,
}

impl TimeAxis {
    /// Step inferred from the contiguous part of the listing
    pub fn step(&self) -> Option<TimeStep> {
        let end = self.truncated_at.unwrap_or(self.timestamps.len());
        infer_step(&self.timestamps[..end])
    }
}

/// Parsed `sinfo` report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub format: String,
    /// Title of the parameter column (`Parameter name`, `Parameter ID`, ...)
    pub parameter_label: String,
    pub variables: Vec<VariableEntry>,
    pub grids: Vec<GridSummary>,
    pub zaxes: Vec<ZaxisSummary>,
    pub time: Option<TimeAxis>,
}

impl DatasetInfo {
    pub fn var_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.parameter.as_str()).collect()
    }

    pub fn nvar(&self) -> usize {
        self.variables.len()
    }

    /// Step count as reported, else the number of listed timestamps
    pub fn ntime(&self) -> Option<u64> {
        let time = self.time.as_ref()?;
        time.steps.or(Some(time.timestamps.len() as u64))
    }

    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let time = self.time.as_ref()?;
        Some((*time.timestamps.first()?, *time.timestamps.last()?))
    }

    pub fn time_step(&self) -> Option<TimeStep> {
        self.time.as_ref()?.step()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Start,
    Header,
    Variables,
    Grids,
    Vertical,
    Time,
}

fn section_heading(text: &str) -> Option<Section> {
    let head = sections(text);
    match head.first().copied()? {
        "Grid coordinates" => Some(Section::Grids),
        "Vertical coordinates" => Some(Section::Vertical),
        "Time coordinate" => Some(Section::Time),
        _ => None,
    }
}

/// Leading integer of text like `points=17415` or `365 steps`
fn leading_number<T: std::str::FromStr>(text: &str) -> Option<T> {
    let digits: String = text.chars().skip_while(|c| !c.is_ascii_digit()).take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn parse_grid_line(parts: &[&str], line: &Line<'_>) -> Result<GridSummary, ParseError> {
    let index = parts[0]
        .parse()
        .map_err(|_| ParseError::invalid("grid index", parts[0], SINFO_SHAPE, line))?;
    let extent = parts.get(2).copied().unwrap_or_default();
    let points = extent
        .split_whitespace()
        .find_map(|t| t.strip_prefix("points="))
        .and_then(leading_number);
    let dims = extent
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| inner.split('x').filter_map(|d| d.trim().parse().ok()).collect())
        .unwrap_or_default();
    Ok(GridSummary {
        index,
        gridtype: parts[1].to_string(),
        points,
        dims,
        details: Vec::new(),
    })
}

fn parse_zaxis_line(parts: &[&str], line: &Line<'_>) -> Result<ZaxisSummary, ParseError> {
    let index = parts[0]
        .parse()
        .map_err(|_| ParseError::invalid("zaxis index", parts[0], SINFO_SHAPE, line))?;
    let levels = parts
        .get(2)
        .and_then(|extent| extent.split_whitespace().find_map(|t| t.strip_prefix("levels=")))
        .and_then(leading_number);
    Ok(ZaxisSummary {
        index,
        zaxistype: parts[1].to_string(),
        levels,
        details: Vec::new(),
    })
}

/// `RefTime =  1901-01-01 00:00:00  Units = days  Calendar = standard`
fn parse_reference_line(text: &str, time: &mut TimeAxis, line: &Line<'_>) -> Result<(), ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut i = 0;
    while i + 1 < tokens.len() {
        match (tokens[i], tokens.get(i + 1).copied()) {
            ("RefTime", Some("=")) => {
                let date = tokens.get(i + 2).copied().unwrap_or_default();
                let clock = tokens.get(i + 3).copied().unwrap_or("00:00:00");
                let stamp = format!("{} {}", date, clock);
                let parsed = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S")
                    .map_err(|_| ParseError::invalid("RefTime", &stamp, SINFO_SHAPE, line))?;
                time.ref_time = Some(parsed);
                i += 4;
            }
            ("Units", Some("=")) => {
                time.units = tokens.get(i + 2).map(|s| s.to_string());
                i += 3;
            }
            ("Calendar", Some("=")) => {
                time.calendar = tokens.get(i + 2).map(|s| s.to_string());
                i += 3;
            }
            _ => i += 1,
        }
    }
    Ok(())
}

struct VariableColumns {
    institute: Option<usize>,
    source: Option<usize>,
    time_type: Option<usize>,
    step_type: Option<usize>,
    levels: usize,
    zaxis: usize,
    points: usize,
    grid: usize,
    dtype: usize,
}

impl VariableColumns {
    fn from_schema(schema: &TableSchema, header: &Line<'_>) -> Result<Self, ParseError> {
        let nums = schema.positions("Num");
        let (zaxis, grid) = match nums.as_slice() {
            [z, g] => (*z, *g),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingField("Num".into()),
                    SINFO_SHAPE,
                    header.text,
                    Some(header.number),
                ))
            }
        };
        Ok(VariableColumns {
            institute: schema.position("Institut"),
            source: schema.position("Source"),
            time_type: schema.position("T"),
            step_type: schema.position("Steptype").or_else(|| schema.position("Ttype")),
            levels: schema.require("Levels", SINFO_SHAPE, header)?,
            zaxis,
            points: schema.require("Points", SINFO_SHAPE, header)?,
            grid,
            dtype: schema.require("Dtype", SINFO_SHAPE, header)?,
        })
    }
}

/// Forward-only scanner for `sinfo`, `sinfon` and `sinfov` output
#[derive(Debug, Clone, Copy, Default)]
pub struct SinfoParser;

impl Parser for SinfoParser {
    type Output = DatasetInfo;

    fn shape(&self) -> &'static str {
        SINFO_SHAPE
    }

    fn parse(&self, text: &str) -> Result<DatasetInfo, ParseError> {
        let mut state = Section::Start;
        let mut format = None;
        let mut schema: Option<(TableSchema, VariableColumns)> = None;
        let mut info = DatasetInfo {
            format: String::new(),
            parameter_label: String::new(),
            variables: Vec::new(),
            grids: Vec::new(),
            zaxes: Vec::new(),
            time: None,
        };

        for line in lines(text) {
            if let Some(next) = section_heading(line.text) {
                if next <= state || state < Section::Variables {
                    return Err(ParseError::unexpected(SINFO_SHAPE, &line));
                }
                log::trace!("sinfo: {:?} -> {:?} at line {}", state, next, line.number);
                state = next;
                if next == Section::Time {
                    let mut time = TimeAxis::default();
                    if let Some(rest) = sections(line.text).get(1) {
                        time.steps = leading_number(rest);
                    }
                    info.time = Some(time);
                }
                continue;
            }

            match state {
                Section::Start => match split_key_value(line.text, ':') {
                    Some(("File format", value)) => {
                        format = Some(value.to_string());
                        state = Section::Header;
                    }
                    _ => return Err(ParseError::missing("File format", SINFO_SHAPE, line.text)),
                },
                Section::Header => {
                    if !TableSchema::is_header(line.text) {
                        return Err(ParseError::unexpected(SINFO_SHAPE, &line));
                    }
                    let table = TableSchema::from_header(&line, SINFO_SHAPE)?;
                    let columns = VariableColumns::from_schema(&table, &line)?;
                    info.parameter_label = table.label.clone();
                    schema = Some((table, columns));
                    state = Section::Variables;
                }
                Section::Variables => {
                    let (table, cols) = match &schema {
                        Some(pair) => pair,
                        None => return Err(ParseError::unexpected(SINFO_SHAPE, &line)),
                    };
                    let row = table.row(&line, SINFO_SHAPE)?;
                    let text_at = |pos: Option<usize>| pos.and_then(|p| row.cells.get(p)).map(|s| s.to_string());
                    info.variables.push(VariableEntry {
                        index: row.index.parse().map_err(|_| ParseError::invalid("index", row.index, SINFO_SHAPE, &line))?,
                        institute: text_at(cols.institute),
                        source: text_at(cols.source),
                        time_type: text_at(cols.time_type),
                        step_type: text_at(cols.step_type),
                        levels: row.get(cols.levels, "Levels", SINFO_SHAPE)?,
                        zaxis: row.get(cols.zaxis, "Num", SINFO_SHAPE)?,
                        points: row.get(cols.points, "Points", SINFO_SHAPE)?,
                        grid: row.get(cols.grid, "Num", SINFO_SHAPE)?,
                        dtype: row.get(cols.dtype, "Dtype", SINFO_SHAPE)?,
                        parameter: row.label.to_string(),
                    });
                }
                Section::Grids => {
                    let parts = sections(line.text);
                    match parts.as_slice() {
                        [index, ..] if parts.len() >= 2 && index.parse::<u32>().is_ok() => {
                            info.grids.push(parse_grid_line(&parts, &line)?);
                        }
                        [key, value] => match info.grids.last_mut() {
                            Some(grid) => grid.details.push((key.to_string(), value.to_string())),
                            None => return Err(ParseError::unexpected(SINFO_SHAPE, &line)),
                        },
                        _ => return Err(ParseError::unexpected(SINFO_SHAPE, &line)),
                    }
                }
                Section::Vertical => {
                    let parts = sections(line.text);
                    match parts.as_slice() {
                        [index, ..] if parts.len() >= 2 && index.parse::<u32>().is_ok() => {
                            info.zaxes.push(parse_zaxis_line(&parts, &line)?);
                        }
                        [key, value] => match info.zaxes.last_mut() {
                            Some(zaxis) => zaxis.details.push((key.to_string(), value.to_string())),
                            None => return Err(ParseError::unexpected(SINFO_SHAPE, &line)),
                        },
                        _ => return Err(ParseError::unexpected(SINFO_SHAPE, &line)),
                    }
                }
                Section::Time => {
                    let time = info.time.get_or_insert_with(TimeAxis::default);
                    if line.text.starts_with("YYYY") {
                        continue;
                    }
                    if line.text.chars().all(|c| c == '.') {
                        time.truncated_at = Some(time.timestamps.len());
                        continue;
                    }
                    if line.text.starts_with("RefTime") {
                        parse_reference_line(line.text, time, &line)?;
                        continue;
                    }
                    match split_key_value(line.text, ':') {
                        Some(("time", value)) => time.steps = leading_number(value),
                        _ => time.timestamps.extend(timestamps_on(&line, SINFO_SHAPE)?),
                    }
                }
            }
        }

        match (format, state) {
            (None, _) => Err(ParseError::missing("File format", SINFO_SHAPE, text)),
            (Some(_), Section::Header) => Err(ParseError::missing("variable table header", SINFO_SHAPE, text)),
            (Some(format), _) => {
                info.format = format;
                Ok(info)
            }
        }
    }
}

/// Level column of `info` output: numeric, or a label like `surface`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Level {
    Numeric(f64),
    Named(String),
}

impl Level {
    fn from_cell(cell: &str) -> Level {
        match cell.parse::<f64>() {
            Ok(v) => Level::Numeric(v),
            Err(_) => Level::Named(cell.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Level::Numeric(v) => Some(*v),
            Level::Named(_) => None,
        }
    }
}

/// One record (timestep, level, variable) of `info` output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoEntry {
    pub index: u32,
    pub timestamp: NaiveDateTime,
    pub level: Level,
    pub gridsize: u64,
    pub missing: Option<u64>,
    pub num: Option<u32>,
    pub dtype: Option<String>,
    pub minimum: Option<f64>,
    pub mean: Option<f64>,
    pub maximum: Option<f64>,
    pub parameter: String,
}

impl InfoEntry {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoTable {
    pub format: Option<String>,
    pub entries: Vec<InfoEntry>,
}

impl InfoTable {
    /// Distinct timestamps in order of appearance
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        let mut out: Vec<NaiveDateTime> = Vec::new();
        for entry in &self.entries {
            if !out.contains(&entry.timestamp) {
                out.push(entry.timestamp);
            }
        }
        out
    }

    /// Distinct parameters in order of appearance
    pub fn parameters(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !out.contains(&entry.parameter.as_str()) {
                out.push(&entry.parameter);
            }
        }
        out
    }

    pub fn time_step(&self) -> Option<TimeStep> {
        infer_step(&self.timestamps())
    }
}

struct InfoColumns {
    date: usize,
    time: usize,
    level: usize,
    gridsize: usize,
    missing: Option<usize>,
    num: Option<usize>,
    dtype: Option<usize>,
    minimum: Option<usize>,
    mean: Option<usize>,
    maximum: Option<usize>,
}

impl InfoColumns {
    fn from_schema(schema: &TableSchema, header: &Line<'_>) -> Result<Self, ParseError> {
        Ok(InfoColumns {
            date: schema.require("Date", INFO_SHAPE, header)?,
            time: schema.require("Time", INFO_SHAPE, header)?,
            level: schema.require("Level", INFO_SHAPE, header)?,
            gridsize: schema.require("Gridsize", INFO_SHAPE, header)?,
            missing: schema.position("Miss"),
            num: schema.position("Num"),
            dtype: schema.position("Dtype"),
            minimum: schema.position("Minimum"),
            mean: schema.position("Mean"),
            maximum: schema.position("Maximum"),
        })
    }
}

/// Header-driven scanner for `info`, `infon` and `infov` tables
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoTableParser;

impl Parser for InfoTableParser {
    type Output = InfoTable;

    fn shape(&self) -> &'static str {
        INFO_SHAPE
    }

    fn parse(&self, text: &str) -> Result<InfoTable, ParseError> {
        let mut format = None;
        let mut schema: Option<(TableSchema, InfoColumns)> = None;
        let mut entries = Vec::new();

        for line in lines(text) {
            if TableSchema::is_header(line.text) {
                let table = TableSchema::from_header(&line, INFO_SHAPE)?;
                let columns = InfoColumns::from_schema(&table, &line)?;
                log::trace!("info: header at line {}", line.number);
                schema = Some((table, columns));
                continue;
            }

            let (table, cols) = match &schema {
                Some(pair) => pair,
                None => match split_key_value(line.text, ':') {
                    Some(("File format", value)) if format.is_none() => {
                        format = Some(value.to_string());
                        continue;
                    }
                    _ => return Err(ParseError::unexpected(INFO_SHAPE, &line)),
                },
            };

            let row = table.row(&line, INFO_SHAPE)?;
            let date: String = row.get(cols.date, "Date", INFO_SHAPE)?;
            let clock: String = row.get(cols.time, "Time", INFO_SHAPE)?;
            let stamp = format!("{} {}", date, clock);
            let timestamp = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S")
                .map_err(|_| ParseError::invalid("Date", &stamp, INFO_SHAPE, &line))?;
            let level: String = row.get(cols.level, "Level", INFO_SHAPE)?;

            entries.push(InfoEntry {
                index: row
                    .index
                    .parse()
                    .map_err(|_| ParseError::invalid("index", row.index, INFO_SHAPE, &line))?,
                timestamp,
                level: Level::from_cell(&level),
                gridsize: row.get(cols.gridsize, "Gridsize", INFO_SHAPE)?,
                missing: row.get_opt(cols.missing, "Miss", INFO_SHAPE)?,
                num: row.get_opt(cols.num, "Num", INFO_SHAPE)?,
                dtype: row.get_opt(cols.dtype, "Dtype", INFO_SHAPE)?,
                minimum: row.get_opt(cols.minimum, "Minimum", INFO_SHAPE)?,
                mean: row.get_opt(cols.mean, "Mean", INFO_SHAPE)?,
                maximum: row.get_opt(cols.maximum, "Maximum", INFO_SHAPE)?,
                parameter: row.label.to_string(),
            });
        }

        if schema.is_none() {
            return Err(ParseError::missing("table header", INFO_SHAPE, text));
        }
        Ok(InfoTable { format, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINFO: &str = "
   File format : NetCDF4
    -1 : Institut Source   T Steptype Levels Num    Points Num Dtype : Parameter name
     1 : unknown  unknown  v instant       1   1     17415   1  F32  : rf
     2 : unknown  unknown  c instant       1   1     17415   1  F32  : mask
   Grid coordinates :
     1 : lonlat                   : points=17415 (135x129)
                        longitude : 66.625 to 100.125 by 0.25 degrees_east
                         latitude : 6.625 to 38.625 by 0.25 degrees_north
   Vertical coordinates :
     1 : surface                  : levels=1
   Time coordinate :
                             time : 6 steps
     RefTime =  1901-01-01 00:00:00  Units = days  Calendar = standard
  YYYY-MM-DD hh:mm:ss  YYYY-MM-DD hh:mm:ss  YYYY-MM-DD hh:mm:ss  YYYY-MM-DD hh:mm:ss
  1901-01-01 00:00:00  1901-01-02 00:00:00  1901-01-03 00:00:00  1901-01-04 00:00:00
  ................................................................................
  1901-03-01 00:00:00  1901-04-01 00:00:00
cdo    sinfon: Processed 2 variables over 6 timesteps [0.50s 63MB]
";

    #[test]
    fn sinfo_sections() {
        let info = SinfoParser.parse(SINFO).unwrap();
        assert_eq!(info.format, "NetCDF4");
        assert_eq!(info.parameter_label, "Parameter name");
        assert_eq!(info.var_names(), vec!["rf", "mask"]);
        assert_eq!(info.variables[1].time_type.as_deref(), Some("c"));
        assert_eq!(info.variables[0].points, 17415);

        let grid = &info.grids[0];
        assert_eq!(grid.gridtype, "lonlat");
        assert_eq!(grid.points, Some(17415));
        assert_eq!(grid.dims, vec![135, 129]);
        assert_eq!(grid.details[0].0, "longitude");
        assert_eq!(info.zaxes[0].levels, Some(1));
    }

    #[test]
    fn sinfo_time_axis() {
        let info = SinfoParser.parse(SINFO).unwrap();
        let time = info.time.as_ref().unwrap();
        assert_eq!(time.steps, Some(6));
        assert_eq!(time.calendar.as_deref(), Some("standard"));
        assert_eq!(time.units.as_deref(), Some("days"));
        assert_eq!(time.truncated_at, Some(4));
        assert_eq!(info.ntime(), Some(6));
        assert_eq!(info.time_step(), Some(TimeStep::Fixed { seconds: 86_400 }));
        let (first, last) = info.time_range().unwrap();
        assert_eq!(first.to_string(), "1901-01-01 00:00:00");
        assert_eq!(last.to_string(), "1901-04-01 00:00:00");
    }

    #[test]
    fn sinfo_requires_format() {
        let err = SinfoParser.parse("  -1 : Levels : Parameter name\n").unwrap_err();
        assert_eq!(err.missing_field(), Some("File format"));
    }

    #[test]
    fn sinfo_requires_num_columns() {
        let text = "File format : GRIB\n -1 : Levels Points Dtype : Parameter ID\n";
        let err = SinfoParser.parse(text).unwrap_err();
        assert_eq!(err.missing_field(), Some("Num"));
    }

    #[test]
    fn sinfo_sections_are_forward_only() {
        let text = "File format : GRIB\n\
                    -1 : Levels Num Points Num Dtype : Parameter ID\n\
                    1 : 1 1 10 1 F32 : 130\n\
                    Time coordinate :\n\
                    Grid coordinates :\n";
        let err = SinfoParser.parse(text).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedLine);
        assert_eq!(err.line, Some(5));
    }

    #[test]
    fn info_with_statistics() {
        let text = "
    -1 :       Date     Time   Level Gridsize    Miss :     Minimum        Mean     Maximum : Parameter ID
     1 : 1901-01-01 00:00:00       0    17415   10915 :      0.0000     0.45573      64.250 : -1
     2 : 1901-01-02 00:00:00       0    17415   10915 :      0.0000      1.2031      93.500 : -1
";
        let table = InfoTableParser.parse(text).unwrap();
        assert_eq!(table.format, None);
        assert_eq!(table.entries.len(), 2);
        let first = &table.entries[0];
        assert_eq!(first.missing, Some(10915));
        assert_eq!(first.mean, Some(0.45573));
        assert_eq!(first.level, Level::Numeric(0.0));
        assert_eq!(table.parameters(), vec!["-1"]);
        assert_eq!(table.time_step(), Some(TimeStep::Fixed { seconds: 86_400 }));
    }

    #[test]
    fn info_without_header_fails() {
        let err = InfoTableParser.parse("File format : NetCDF\n").unwrap_err();
        assert_eq!(err.missing_field(), Some("table header"));
    }
}
