//! Grid and vertical axis descriptions (`griddes`, `zaxisdes`)

use serde::Serialize;

use super::scan::{key_value_blocks, Fields};
use super::{ParseError, Parser};

const GRID_SHAPE: &str = "griddes blocks (gridtype = ...)";
const ZAXIS_SHAPE: &str = "zaxisdes blocks (zaxistype = ...)";

const GRID_KEYS: &[&str] = &[
    "gridtype", "gridsize", "datatype", "xsize", "ysize", "xname", "xlongname", "xunits", "yname",
    "ylongname", "yunits", "xfirst", "xinc", "yfirst", "yinc", "xvals", "yvals", "xbounds",
    "ybounds", "grid_mapping", "grid_mapping_name",
];

const ZAXIS_KEYS: &[&str] = &[
    "zaxistype", "size", "name", "longname", "units", "levels", "lbounds", "ubounds", "vctsize",
    "vct",
];

/// One horizontal grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridInfo {
    pub grid_id: u32,
    pub gridtype: String,
    pub gridsize: u64,
    pub datatype: Option<String>,
    pub xsize: Option<u64>,
    pub ysize: Option<u64>,
    pub xname: Option<String>,
    pub xlongname: Option<String>,
    pub xunits: Option<String>,
    pub yname: Option<String>,
    pub ylongname: Option<String>,
    pub yunits: Option<String>,
    pub xfirst: Option<f64>,
    pub xinc: Option<f64>,
    pub yfirst: Option<f64>,
    pub yinc: Option<f64>,
    pub xvals: Vec<f64>,
    pub yvals: Vec<f64>,
    pub xbounds: Vec<f64>,
    pub ybounds: Vec<f64>,
    pub grid_mapping: Option<String>,
    pub grid_mapping_name: Option<String>,
    /// Remaining keys (projection parameters and the like), in input order
    pub attributes: Vec<(String, String)>,
}

fn span(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))))
}

fn regular_span(first: Option<f64>, inc: Option<f64>, size: Option<u64>) -> Option<(f64, f64)> {
    let (first, inc, size) = (first?, inc?, size?);
    let last = first + size.saturating_sub(1) as f64 * inc;
    Some((first.min(last), first.max(last)))
}

impl GridInfo {
    fn from_fields(fields: &Fields) -> Result<Self, ParseError> {
        Ok(GridInfo {
            grid_id: fields.id,
            gridtype: fields.required_text("gridtype")?,
            gridsize: fields.required("gridsize")?,
            datatype: fields.text("datatype"),
            xsize: fields.optional("xsize")?,
            ysize: fields.optional("ysize")?,
            xname: fields.text("xname"),
            xlongname: fields.text("xlongname"),
            xunits: fields.text("xunits"),
            yname: fields.text("yname"),
            ylongname: fields.text("ylongname"),
            yunits: fields.text("yunits"),
            xfirst: fields.optional("xfirst")?,
            xinc: fields.optional("xinc")?,
            yfirst: fields.optional("yfirst")?,
            yinc: fields.optional("yinc")?,
            xvals: fields.floats("xvals")?,
            yvals: fields.floats("yvals")?,
            xbounds: fields.floats("xbounds")?,
            ybounds: fields.floats("ybounds")?,
            grid_mapping: fields.text("grid_mapping"),
            grid_mapping_name: fields.text("grid_mapping_name"),
            attributes: fields.extras(GRID_KEYS),
        })
    }

    /// (min, max) longitude, from explicit values or first/increment/size
    pub fn lon_range(&self) -> Option<(f64, f64)> {
        span(&self.xvals).or_else(|| regular_span(self.xfirst, self.xinc, self.xsize))
    }

    pub fn lat_range(&self) -> Option<(f64, f64)> {
        span(&self.yvals).or_else(|| regular_span(self.yfirst, self.yinc, self.ysize))
    }

    /// (x, y) increments of a regular grid
    pub fn resolution(&self) -> Option<(f64, f64)> {
        Some((self.xinc?, self.yinc?))
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        self.attribute(key)?.parse().ok()
    }
}

/// All grids of a dataset, in output order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridReport {
    pub grids: Vec<GridInfo>,
}

impl GridReport {
    pub fn ngrids(&self) -> usize {
        self.grids.len()
    }

    pub fn primary_grid(&self) -> Option<&GridInfo> {
        self.grids.first()
    }

    pub fn grid(&self, grid_id: u32) -> Option<&GridInfo> {
        self.grids.iter().find(|g| g.grid_id == grid_id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GriddesParser;

impl Parser for GriddesParser {
    type Output = GridReport;

    fn shape(&self) -> &'static str {
        GRID_SHAPE
    }

    fn parse(&self, text: &str) -> Result<GridReport, ParseError> {
        let grids = key_value_blocks(text, "gridtype", GRID_SHAPE)?
            .iter()
            .map(GridInfo::from_fields)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GridReport { grids })
    }
}

/// One vertical axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZaxisInfo {
    pub zaxis_id: u32,
    pub zaxistype: String,
    pub size: u64,
    pub name: Option<String>,
    pub longname: Option<String>,
    pub units: Option<String>,
    pub levels: Vec<f64>,
    pub lbounds: Vec<f64>,
    pub ubounds: Vec<f64>,
    pub vctsize: Option<u64>,
    pub vct: Vec<f64>,
    pub attributes: Vec<(String, String)>,
}

impl ZaxisInfo {
    fn from_fields(fields: &Fields) -> Result<Self, ParseError> {
        Ok(ZaxisInfo {
            zaxis_id: fields.id,
            zaxistype: fields.required_text("zaxistype")?,
            size: fields.required("size")?,
            name: fields.text("name"),
            longname: fields.text("longname"),
            units: fields.text("units"),
            levels: fields.floats("levels")?,
            lbounds: fields.floats("lbounds")?,
            ubounds: fields.floats("ubounds")?,
            vctsize: fields.optional("vctsize")?,
            vct: fields.floats("vct")?,
            attributes: fields.extras(ZAXIS_KEYS),
        })
    }

    pub fn is_surface(&self) -> bool {
        self.zaxistype == "surface"
    }

    /// (min, max) of the listed levels
    pub fn level_range(&self) -> Option<(f64, f64)> {
        span(&self.levels)
    }

    pub fn nlevels(&self) -> usize {
        if self.levels.is_empty() {
            self.size as usize
        } else {
            self.levels.len()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZaxisReport {
    pub zaxes: Vec<ZaxisInfo>,
}

impl ZaxisReport {
    pub fn nzaxes(&self) -> usize {
        self.zaxes.len()
    }

    pub fn primary_zaxis(&self) -> Option<&ZaxisInfo> {
        self.zaxes.first()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZaxisdesParser;

impl Parser for ZaxisdesParser {
    type Output = ZaxisReport;

    fn shape(&self) -> &'static str {
        ZAXIS_SHAPE
    }

    fn parse(&self, text: &str) -> Result<ZaxisReport, ParseError> {
        let zaxes = key_value_blocks(text, "zaxistype", ZAXIS_SHAPE)?
            .iter()
            .map(ZaxisInfo::from_fields)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ZaxisReport { zaxes })
    }
}
