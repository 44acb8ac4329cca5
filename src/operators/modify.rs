//! Metadata modification and interpolation

use super::non_empty;
use crate::ast::{Arg, Pipeline};
use crate::error::ValidationError;

/// Calendars accepted by `setcalendar`
pub const CALENDARS: &[&str] = &["standard", "proleptic_gregorian", "360_day", "365_day", "366_day"];

impl Pipeline {
    pub fn set_name(&self, name: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("setname", vec![Arg::from(name)])
    }

    pub fn set_unit(&self, unit: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("setunit", vec![Arg::from(unit)])
    }

    pub fn set_missval(&self, value: f64) -> Result<Pipeline, ValidationError> {
        self.with_operation("setmissval", vec![Arg::from(value)])
    }

    /// `-chname,old,new`
    pub fn change_name(&self, old: &str, new: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("chname", vec![Arg::from(old), Arg::from(new)])
    }

    pub fn set_calendar(&self, calendar: &str) -> Result<Pipeline, ValidationError> {
        if !calendar.is_empty() && !CALENDARS.contains(&calendar) {
            return Err(ValidationError::out_of_range(
                "setcalendar",
                "calendar",
                calendar,
                CALENDARS.join("|"),
            ));
        }
        self.with_operation("setcalendar", vec![Arg::from(calendar)])
    }

    /// Bilinear remap onto `grid` (a grid name like `r360x180` or a grid file)
    pub fn remap_bil(&self, grid: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("remapbil", vec![Arg::from(grid)])
    }

    pub fn remap_bic(&self, grid: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("remapbic", vec![Arg::from(grid)])
    }

    pub fn remap_nn(&self, grid: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("remapnn", vec![Arg::from(grid)])
    }

    /// First order conservative remap
    pub fn remap_con(&self, grid: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("remapcon", vec![Arg::from(grid)])
    }

    pub fn remap_dis(&self, grid: &str) -> Result<Pipeline, ValidationError> {
        self.with_operation("remapdis", vec![Arg::from(grid)])
    }

    /// Linear vertical interpolation to `levels`
    pub fn inter_level(&self, levels: &[f64]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("intlevel", "levels", levels)?;
        self.with_operation("intlevel", args)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Pipeline;
    use crate::emitter::emit_fragment;

    #[test]
    fn test_change_name() {
        let p = Pipeline::bind("in.nc").change_name("t2m", "tas").unwrap();
        assert_eq!(emit_fragment(&p).unwrap(), "-chname,t2m,tas in.nc");
    }

    #[test]
    fn test_set_unit_rejects_whitespace() {
        let err = Pipeline::bind("in.nc").set_unit("deg C").unwrap_err();
        assert_eq!(err.parameter, "unit");
    }

    #[test]
    fn test_set_calendar_validates() {
        let p = Pipeline::bind("in.nc");
        assert!(p.set_calendar("360_day").is_ok());
        let err = p.set_calendar("julian_ish").unwrap_err();
        assert_eq!(err.parameter, "calendar");
        assert!(p.set_calendar("").unwrap_err().is_empty_argument());
    }

    #[test]
    fn test_remap_and_intlevel() {
        let p = Pipeline::bind("in.nc")
            .remap_bil("r360x180")
            .unwrap()
            .inter_level(&[85000.0, 50000.0])
            .unwrap();
        assert_eq!(
            emit_fragment(&p).unwrap(),
            "-intlevel,85000,50000 -remapbil,r360x180 in.nc"
        );
    }

    #[test]
    fn test_remap_requires_grid() {
        let err = Pipeline::bind("in.nc").remap_con("").unwrap_err();
        assert_eq!(err.parameter, "grid");
    }
}
