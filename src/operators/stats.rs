//! Statistical reductions (time, field, vertical)

use crate::ast::{Arg, Pipeline};
use crate::error::ValidationError;

macro_rules! reductions {
    ($($(#[$doc:meta])* $method:ident => $op:literal;)*) => {
        impl Pipeline {
            $(
                $(#[$doc])*
                pub fn $method(&self) -> Pipeline {
                    self.then_static($op)
                }
            )*
        }

        #[cfg(test)]
        const REDUCTION_NAMES: &[&str] = &[$($op),*];
    };
}

reductions! {
    /// Annual mean per calendar year
    year_mean => "yearmean";
    year_sum => "yearsum";
    year_max => "yearmax";
    year_min => "yearmin";
    month_mean => "monmean";
    month_sum => "monsum";
    day_mean => "daymean";
    day_sum => "daysum";
    season_mean => "seasmean";
    /// Mean over all timesteps
    time_mean => "timmean";
    time_max => "timmax";
    time_min => "timmin";
    time_std => "timstd";
    /// Multi-year monthly mean (climatology)
    ymon_mean => "ymonmean";
    yday_mean => "ydaymean";
    /// Area-weighted field mean
    fld_mean => "fldmean";
    fld_sum => "fldsum";
    fld_max => "fldmax";
    fld_min => "fldmin";
    zon_mean => "zonmean";
    mer_mean => "mermean";
    vert_mean => "vertmean";
    vert_sum => "vertsum";
}

impl Pipeline {
    /// Running mean over `window` timesteps
    pub fn run_mean(&self, window: i32) -> Result<Pipeline, ValidationError> {
        super::in_range("runmean", "window", &[window], 1, i32::MAX)?;
        self.with_operation("runmean", vec![Arg::from(window)])
    }
}
