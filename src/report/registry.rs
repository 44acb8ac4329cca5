//! Report kind registry
//!
//! Maps the name of every printing operator to the parser for its output.
//! Alternate parsers for the same kind are registered as named variants and
//! selected explicitly with `use_variant`; nothing is auto-detected.
//!
//! `sinfo` expects the dataset overview (`Institut Source ... Levels Num Points
//! Num Dtype` plus the grid, vertical and time sections). Tools that print a
//! per-timestep `Date Time Level Gridsize Num Dtype` table for it can be read by
//! pointing the kind at the `info-table` variant:
//!
//! ```
//! use cdoq::{ParserRegistry, Report};
//!
//! let mut registry = ParserRegistry::default();
//! registry.use_variant("sinfo", "info-table").unwrap();
//! let text = "File format: NetCDF\n\
//!     -1 : Date Time Level Gridsize Num Dtype : Parameter name\n\
//!      1 : 2020-01-01 00:00:00 0 518400 1 F64 : tas\n";
//! assert!(matches!(registry.parse("sinfo", text).unwrap(), Report::Info(_)));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use super::{
    CountParser, GriddesParser, InfoTableParser, NamesParser, PartabNamelistParser,
    PartabTableParser, Report, ReportParser, ShowattsParser, ShowattsglobParser, SinfoParser,
    TimelineParser, VctParser, VersionParser, VlistParser, ZaxisdesParser,
};
use crate::emitter::DEFAULT_INVOCATION;
use crate::error::{CdoError, Result};
use crate::lexer::leading_operator;
use crate::parser::GrammarError;

/// Default kind → variant routing
const DEFAULT_KINDS: &[(&str, &str)] = &[
    ("griddes", "griddes"),
    ("griddes2", "griddes"),
    ("zaxisdes", "zaxisdes"),
    ("sinfo", "sinfo"),
    ("sinfon", "sinfo"),
    ("sinfov", "sinfo"),
    ("info", "info-table"),
    ("infon", "info-table"),
    ("infov", "info-table"),
    ("vlist", "vlist"),
    ("showatts", "showatts"),
    ("showattsglob", "showattsglob"),
    ("partab", "partab-namelist"),
    ("codetab", "partab-table"),
    ("vct", "vct"),
    ("vct2", "vct"),
    ("showname", "names"),
    ("showvar", "names"),
    ("showdate", "timeline"),
    ("showtimestamp", "timeline"),
    ("ntime", "count"),
    ("nvar", "count"),
    ("nlevel", "count"),
    ("nyear", "count"),
    ("nmon", "count"),
    ("ndate", "count"),
    ("ngridpoints", "count"),
    ("version", "version"),
];

#[derive(Clone)]
pub struct ParserRegistry {
    kinds: HashMap<String, Arc<dyn ReportParser>>,
    variants: HashMap<String, Arc<dyn ReportParser>>,
    invocation: String,
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("kinds", &self.supported_kinds())
            .field("variants", &self.variants.keys().collect::<BTreeSet<_>>())
            .finish()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ParserRegistry {
    /// Registry with no kinds and no variants
    pub fn empty() -> Self {
        ParserRegistry {
            kinds: HashMap::new(),
            variants: HashMap::new(),
            invocation: DEFAULT_INVOCATION.to_string(),
        }
    }

    /// Every built-in variant, with each default kind routed to it
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.add_variant("griddes", GriddesParser);
        registry.add_variant("zaxisdes", ZaxisdesParser);
        registry.add_variant("sinfo", SinfoParser);
        registry.add_variant("info-table", InfoTableParser);
        registry.add_variant("vlist", VlistParser);
        registry.add_variant("showatts", ShowattsParser);
        registry.add_variant("showattsglob", ShowattsglobParser);
        registry.add_variant("partab-namelist", PartabNamelistParser);
        registry.add_variant("partab-table", PartabTableParser);
        registry.add_variant("vct", VctParser);
        registry.add_variant("names", NamesParser);
        registry.add_variant("timeline", TimelineParser);
        registry.add_variant("count", CountParser);
        registry.add_variant("version", VersionParser);

        for (kind, variant) in DEFAULT_KINDS {
            if let Some(parser) = registry.variants.get(*variant).cloned() {
                registry.kinds.insert(kind.to_string(), parser);
            }
        }
        registry
    }

    /// Invocation token skipped by `parse_command_output`
    pub fn with_invocation(mut self, invocation: impl Into<String>) -> Self {
        self.invocation = invocation.into();
        self
    }

    /// Register a named alternate parser
    pub fn add_variant<P: ReportParser + 'static>(&mut self, name: &str, parser: P) {
        self.variants.insert(name.to_string(), Arc::new(parser));
    }

    /// Route `kind` to `parser`, replacing any previous route
    pub fn register<P: ReportParser + 'static>(&mut self, kind: &str, parser: P) {
        self.kinds.insert(kind.to_lowercase(), Arc::new(parser));
    }

    /// Route `kind` to a previously registered variant
    pub fn use_variant(&mut self, kind: &str, variant: &str) -> Result<()> {
        let parser = self.variant(variant).ok_or_else(|| CdoError::NotFound {
            kind: variant.to_string(),
        })?;
        log::debug!("report kind '{}' now uses variant '{}'", kind, variant);
        self.kinds.insert(kind.to_lowercase(), parser);
        Ok(())
    }

    pub fn variant(&self, name: &str) -> Option<Arc<dyn ReportParser>> {
        self.variants.get(name).cloned()
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ReportParser>> {
        self.kinds.get(&kind.to_lowercase()).cloned()
    }

    pub fn supported_kinds(&self) -> BTreeSet<String> {
        self.kinds.keys().cloned().collect()
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.kinds.contains_key(&kind.to_lowercase())
    }

    /// Parse `text` as a report of `kind`
    pub fn parse(&self, kind: &str, text: &str) -> Result<Report> {
        let parser = self.get(kind).ok_or_else(|| CdoError::NotFound {
            kind: kind.to_lowercase(),
        })?;
        log::debug!("parsing '{}' output as {}", kind, parser.shape());
        Ok(parser.parse_report(text)?)
    }

    /// Parse output using the leading operator of the command that made it
    pub fn parse_command_output(&self, command: &str, text: &str) -> Result<Report> {
        let kind = leading_operator(command, &self.invocation)
            .map_err(GrammarError::from)?
            .ok_or(GrammarError::EmptyInput)?;
        self.parse(&kind, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Count, Parser};

    #[test]
    fn defaults_cover_report_operators() {
        let registry = ParserRegistry::default();
        for kind in crate::operators::REPORT_OPERATORS {
            assert!(registry.supports(kind), "missing parser for {}", kind);
        }
        assert!(registry.supports("version"));
    }

    #[test]
    fn supported_kinds_are_sorted() {
        let kinds: Vec<String> = ParserRegistry::default().supported_kinds().into_iter().collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
    }

    #[test]
    fn unknown_kind_is_not_found() {
        let err = ParserRegistry::default().parse("unsupported_cmd", "x").unwrap_err();
        assert!(matches!(err, CdoError::NotFound { kind } if kind == "unsupported_cmd"));
    }

    #[test]
    fn use_variant_repoints_kind() {
        let mut registry = ParserRegistry::default();
        registry.use_variant("partab", "partab-table").unwrap();
        let report = registry.parse("partab", "1 | tas | K | Air temperature\n").unwrap();
        assert!(matches!(report, Report::Parameters(t) if t.entries[0].name == "tas"));
        assert!(registry.use_variant("partab", "nope").is_err());
    }

    struct Always;

    impl Parser for Always {
        type Output = Count;

        fn shape(&self) -> &'static str {
            "anything"
        }

        fn parse(&self, _text: &str) -> std::result::Result<Count, crate::report::ParseError> {
            Ok(Count { value: 42 })
        }
    }

    #[test]
    fn register_custom_parser() {
        let mut registry = ParserRegistry::empty();
        registry.register("Answer", Always);
        assert_eq!(registry.parse("answer", "").unwrap(), Report::Count(Count { value: 42 }));
    }

    #[test]
    fn route_by_command() {
        let registry = ParserRegistry::default();
        let report = registry
            .parse_command_output("cdo -s -ntime data.nc", "12\n")
            .unwrap();
        assert_eq!(report, Report::Count(Count { value: 12 }));
        assert!(matches!(
            registry.parse_command_output("", "12"),
            Err(CdoError::Grammar(GrammarError::EmptyInput))
        ));
    }
}
