//! Timestamps (`showdate`, `showtimestamp`) and time-step inference

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::scan::{lines, Line};
use super::{ParseError, Parser};

const TIMELINE_SHAPE: &str = "dates or timestamps (YYYY-MM-DD[Thh:mm:ss])";

/// Regular spacing of a time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeStep {
    /// Constant spacing in seconds
    Fixed { seconds: i64 },
    /// Every `n` calendar months, same day and time of month
    Monthly(u32),
    /// Every `n` calendar years
    Yearly(u32),
    Irregular,
}

fn month_index(ts: &NaiveDateTime) -> i64 {
    i64::from(ts.year()) * 12 + i64::from(ts.month0())
}

/// Infer the step of an ordered timestamp list; `None` below two entries
pub fn infer_step(timestamps: &[NaiveDateTime]) -> Option<TimeStep> {
    let (first, rest) = timestamps.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let diffs: Vec<i64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .collect();
    if diffs[0] > 0 && diffs.iter().all(|d| *d == diffs[0]) {
        return Some(TimeStep::Fixed { seconds: diffs[0] });
    }

    let same_anchor = rest
        .iter()
        .all(|ts| ts.day() == first.day() && ts.time() == first.time());
    let months: Vec<i64> = timestamps
        .windows(2)
        .map(|w| month_index(&w[1]) - month_index(&w[0]))
        .collect();
    if same_anchor && months[0] > 0 && months.iter().all(|m| *m == months[0]) {
        let k = u32::try_from(months[0]).unwrap_or(u32::MAX);
        return Some(if k % 12 == 0 {
            TimeStep::Yearly(k / 12)
        } else {
            TimeStep::Monthly(k)
        });
    }

    Some(TimeStep::Irregular)
}

/// Read every timestamp on a line
///
/// Accepts `YYYY-MM-DDThh:mm:ss`, `YYYY-MM-DD hh:mm:ss` pairs and bare dates
/// (taken at midnight).
pub(crate) fn timestamps_on(line: &Line<'_>, expected: &str) -> Result<Vec<NaiveDateTime>, ParseError> {
    let mut out = Vec::new();
    let mut tokens = line.text.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        if let Ok(ts) = NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S") {
            out.push(ts);
            continue;
        }
        let date = NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .map_err(|_| ParseError::invalid("timestamp", token, expected, line))?;
        let time = match tokens.peek().and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok()) {
            Some(time) => {
                tokens.next();
                time
            }
            None => NaiveTime::MIN,
        };
        out.push(date.and_time(time));
    }
    Ok(out)
}

/// Ordered timestamps of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub timestamps: Vec<NaiveDateTime>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }

    pub fn step(&self) -> Option<TimeStep> {
        infer_step(&self.timestamps)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineParser;

impl Parser for TimelineParser {
    type Output = Timeline;

    fn shape(&self) -> &'static str {
        TIMELINE_SHAPE
    }

    fn parse(&self, text: &str) -> Result<Timeline, ParseError> {
        let mut timestamps = Vec::new();
        for line in lines(text) {
            timestamps.extend(timestamps_on(&line, TIMELINE_SHAPE)?);
        }
        Ok(Timeline { timestamps })
    }
}
