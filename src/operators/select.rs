//! Selection operators

use super::{in_range, non_empty};
use crate::ast::{Arg, Pipeline};
use crate::error::ValidationError;

impl Pipeline {
    /// `-selname,a,b`
    pub fn select_name(&self, names: &[&str]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("selname", "names", names)?;
        self.with_operation("selname", args)
    }

    /// `-selcode,130,131`
    pub fn select_code(&self, codes: &[i32]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("selcode", "codes", codes)?;
        self.with_operation("selcode", args)
    }

    /// `-sellevel,85000,50000`
    pub fn select_level(&self, levels: &[f64]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("sellevel", "levels", levels)?;
        self.with_operation("sellevel", args)
    }

    pub fn select_year(&self, years: &[i32]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("selyear", "years", years)?;
        self.with_operation("selyear", args)
    }

    /// Months are 1-based
    pub fn select_month(&self, months: &[i32]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("selmon", "months", months)?;
        in_range("selmon", "months", months, 1, 12)?;
        self.with_operation("selmon", args)
    }

    /// Seasons such as `DJF` or `JJA`
    pub fn select_season(&self, seasons: &[&str]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("selseas", "seasons", seasons)?;
        self.with_operation("selseas", args)
    }

    /// `-seldate,start[,end]`
    pub fn select_date(&self, start: &str, end: Option<&str>) -> Result<Pipeline, ValidationError> {
        let mut args = vec![Arg::from(start)];
        args.extend(end.map(Arg::from));
        self.with_operation("seldate", args)
    }

    /// Timesteps are 1-based
    pub fn select_timestep(&self, steps: &[i32]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("seltimestep", "steps", steps)?;
        in_range("seltimestep", "steps", steps, 1, i32::MAX)?;
        self.with_operation("seltimestep", args)
    }

    pub fn select_lonlat_box(
        &self,
        lon1: f64,
        lon2: f64,
        lat1: f64,
        lat2: f64,
    ) -> Result<Pipeline, ValidationError> {
        in_range("sellonlatbox", "lat", &[lat1, lat2], -90.0, 90.0)?;
        self.with_operation(
            "sellonlatbox",
            vec![lon1.into(), lon2.into(), lat1.into(), lat2.into()],
        )
    }

    /// Index box `idx1,idx2,idy1,idy2` (1-based)
    pub fn select_index_box(
        &self,
        idx1: i32,
        idx2: i32,
        idy1: i32,
        idy2: i32,
    ) -> Result<Pipeline, ValidationError> {
        let indices = [idx1, idx2, idy1, idy2];
        in_range("selindexbox", "indices", &indices, 1, i32::MAX)?;
        self.with_operation("selindexbox", indices.iter().map(|i| Arg::from(*i)).collect())
    }

    pub fn delete_name(&self, names: &[&str]) -> Result<Pipeline, ValidationError> {
        let args = non_empty("delname", "names", names)?;
        self.with_operation("delname", args)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Pipeline;
    use crate::emitter::emit_fragment;

    #[test]
    fn test_select_name_fragment() {
        let p = Pipeline::bind("data.nc").select_name(&["tas", "pr"]).unwrap();
        assert_eq!(emit_fragment(&p).unwrap(), "-selname,tas,pr data.nc");
    }

    #[test]
    fn test_select_name_requires_names() {
        let err = Pipeline::bind("data.nc").select_name(&[]).unwrap_err();
        assert_eq!(err.parameter, "names");
        assert!(err.is_empty_argument());
    }

    #[test]
    fn test_select_month_range() {
        let p = Pipeline::bind("data.nc");
        assert!(p.select_month(&[6, 7, 8]).is_ok());
        let err = p.select_month(&[0]).unwrap_err();
        assert_eq!(err.parameter, "months");
        assert!(p.select_month(&[13]).is_err());
    }

    #[test]
    fn test_lonlat_box_formats_floats() {
        let p = Pipeline::bind("in.nc")
            .select_lonlat_box(-10.0, 40.5, 30.0, 70.0)
            .unwrap();
        assert_eq!(emit_fragment(&p).unwrap(), "-sellonlatbox,-10,40.5,30,70 in.nc");
    }

    #[test]
    fn test_lonlat_box_rejects_latitude() {
        let err = Pipeline::bind("in.nc")
            .select_lonlat_box(0.0, 10.0, -95.0, 10.0)
            .unwrap_err();
        assert_eq!(err.parameter, "lat");
    }

    #[test]
    fn test_select_date_optional_end() {
        let p = Pipeline::bind("in.nc");
        let one = p.select_date("2000-01-01", None).unwrap();
        let two = p.select_date("2000-01-01", Some("2000-12-31")).unwrap();
        assert_eq!(one.last().unwrap().args().len(), 1);
        assert_eq!(emit_fragment(&two).unwrap(), "-seldate,2000-01-01,2000-12-31 in.nc");
    }

    #[test]
    fn test_select_date_rejects_empty_start() {
        let err = Pipeline::bind("in.nc").select_date("", None).unwrap_err();
        assert_eq!(err.parameter, "dates");
        assert!(err.is_empty_argument());
    }

    #[test]
    fn test_index_box_is_one_based() {
        let err = Pipeline::bind("in.nc").select_index_box(0, 4, 1, 4).unwrap_err();
        assert_eq!(err.parameter, "indices");
    }
}
