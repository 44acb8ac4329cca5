//! Report operators
//!
//! These print a text report instead of writing a dataset, so they are
//! appended last. The session feeds their output through the matching parser.

use crate::ast::{OperationSpec, Pipeline};
use crate::error::ValidationError;

/// Operators whose output is a text report
pub const REPORT_OPERATORS: &[&str] = &[
    "sinfo",
    "sinfon",
    "sinfov",
    "info",
    "infon",
    "infov",
    "griddes",
    "griddes2",
    "zaxisdes",
    "showname",
    "showvar",
    "showdate",
    "showtimestamp",
    "ntime",
    "nvar",
    "nlevel",
    "nyear",
    "nmon",
    "ndate",
    "ngridpoints",
    "showatts",
    "showattsglob",
    "vct",
    "vct2",
    "partab",
    "codetab",
    "vlist",
];

pub fn is_report_operator(name: &str) -> bool {
    REPORT_OPERATORS.contains(&name)
}

impl Pipeline {
    /// Append a report operator by name
    pub fn report(&self, kind: &str) -> Result<Pipeline, ValidationError> {
        Ok(self.then(OperationSpec::bare(kind)?))
    }

    pub fn sinfo(&self) -> Pipeline {
        self.then_static("sinfo")
    }

    pub fn info(&self) -> Pipeline {
        self.then_static("info")
    }

    pub fn griddes(&self) -> Pipeline {
        self.then_static("griddes")
    }

    pub fn zaxisdes(&self) -> Pipeline {
        self.then_static("zaxisdes")
    }

    pub fn showname(&self) -> Pipeline {
        self.then_static("showname")
    }

    pub fn showdate(&self) -> Pipeline {
        self.then_static("showdate")
    }

    pub fn showtimestamp(&self) -> Pipeline {
        self.then_static("showtimestamp")
    }

    pub fn ntime(&self) -> Pipeline {
        self.then_static("ntime")
    }

    pub fn nvar(&self) -> Pipeline {
        self.then_static("nvar")
    }

    pub fn nlevel(&self) -> Pipeline {
        self.then_static("nlevel")
    }

    pub fn showatts(&self) -> Pipeline {
        self.then_static("showatts")
    }

    pub fn showattsglob(&self) -> Pipeline {
        self.then_static("showattsglob")
    }

    pub fn vct(&self) -> Pipeline {
        self.then_static("vct")
    }

    pub fn partab(&self) -> Pipeline {
        self.then_static("partab")
    }

    pub fn codetab(&self) -> Pipeline {
        self.then_static("codetab")
    }

    pub fn vlist(&self) -> Pipeline {
        self.then_static("vlist")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::emit_fragment;

    #[test]
    fn test_report_operator_goes_last() {
        let p = Pipeline::bind("in.nc").select_name(&["tas"]).unwrap().griddes();
        assert_eq!(emit_fragment(&p).unwrap(), "-griddes -selname,tas in.nc");
    }

    #[test]
    fn test_report_by_name() {
        let p = Pipeline::bind("in.nc").report("sinfon").unwrap();
        assert_eq!(p.last().unwrap().name(), "sinfon");
        assert!(Pipeline::bind("in.nc").report("").is_err());
    }

    #[test]
    fn test_report_operator_table() {
        assert!(is_report_operator("griddes"));
        assert!(!is_report_operator("yearmean"));
    }
}
