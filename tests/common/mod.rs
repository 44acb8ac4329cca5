//! Common test utilities for cdoq integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

pub use cdoq::{Cdo, CdoError, ExecuteError, Executor, Pipeline, Synthesizer};

/// Commands seen by a fake executor, oldest first
pub type CommandLog = Rc<RefCell<Vec<String>>>;

/// Executor answering commands that contain a needle with canned text
///
/// Commands with no matching reply fail like a non-zero exit.
pub fn fake_executor(
    replies: &[(&str, &str)],
) -> (impl Fn(&str) -> Result<String, ExecuteError>, CommandLog) {
    let replies: Vec<(String, String)> = replies
        .iter()
        .map(|(needle, text)| (needle.to_string(), text.to_string()))
        .collect();
    let log = CommandLog::default();
    let seen = Rc::clone(&log);

    let executor = move |command: &str| -> Result<String, ExecuteError> {
        seen.borrow_mut().push(command.to_string());
        replies
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, text)| text.clone())
            .ok_or_else(|| ExecuteError::Failed {
                command: command.to_string(),
                code: Some(1),
                stderr: "no canned reply".to_string(),
            })
    };
    (executor, log)
}

pub fn last_command(log: &CommandLog) -> Option<String> {
    log.borrow().last().cloned()
}

pub const GRIDDES: &str = "
#
# gridID 1
#
gridtype  = lonlat
gridsize  = 17415
datatype  = float
xsize     = 135
ysize     = 129
xname     = lon
xlongname = \"longitude\"
xunits    = \"degrees_east\"
yname     = lat
ylongname = \"latitude\"
yunits    = \"degrees_north\"
xfirst    = 66.625
xinc      = 0.25
yfirst    = 6.625
yinc      = 0.25
cdo    griddes: Processed 1 variable [0.01s 41MB]
";

pub const ZAXIS_SURFACE: &str = "
#
# zaxisID 1
#
zaxistype = surface
size      = 1
name      = sfc
longname  = \"surface\"
levels    = 0
";

pub const ZAXIS_PRESSURE: &str = "
zaxistype = pressure
size      = 4
name      = plev
units     = \"Pa\"
levels    = 100000 85000 70000
            50000
";

pub const INFO_HYBRID: &str = "
File format: NetCDF4
   -1 : Date     Time   Level Gridsize    Num    Dtype : Parameter name
    1 : 1901-01-01 00:00:00       0   135360      1  F32    : rf
    2 : 1901-01-02 00:00:00       0   135360      1  F32    : rf
    3 : 1901-01-03 00:00:00       0   135360      1  F32    : rf
    4 : 2019-12-31 00:00:00       0   135360      1  F32    : rf
";

pub const SINFO: &str = "
   File format : NetCDF4
    -1 : Institut Source   T Steptype Levels Num    Points Num Dtype : Parameter name
     1 : unknown  unknown  v instant       1   1     17415   1  F32  : rf
   Grid coordinates :
     1 : lonlat                   : points=17415 (135x129)
                        longitude : 66.625 to 100.125 by 0.25 degrees_east
                         latitude : 6.625 to 38.625 by 0.25 degrees_north
   Vertical coordinates :
     1 : surface                  : levels=1
   Time coordinate :
                             time : 3 steps
     RefTime =  1901-01-01 00:00:00  Units = days  Calendar = standard
  YYYY-MM-DD hh:mm:ss  YYYY-MM-DD hh:mm:ss  YYYY-MM-DD hh:mm:ss
  1901-01-01 00:00:00  1901-01-02 00:00:00  1901-01-03 00:00:00
cdo    sinfon: Processed 1 variable over 3 timesteps [0.05s 40MB]
";

pub const SHOWATTS: &str = "
Temperature attributes:
    long_name = \"Air Temperature\"
    units = \"K\"
    standard_name = \"air_temperature\"

Precipitation attributes:
    long_name = \"Precipitation\"
    units = \"mm/day\"
";

pub const PARTAB: &str = "
&parameter
  name = tas
  code = 167
  units = \"K\"
  long_name = \"near-surface air temperature\"
/
&parameter
  name = pr
  standard_name = precipitation_flux
/
";
