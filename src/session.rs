//! Session facade: synthesize, execute, parse
//!
//! `Cdo` ties the three layers together. It holds no mutable state, so a
//! session can be shared freely as long as its executor can.

use crate::ast::{Expr, Pipeline};
use crate::emitter::Synthesizer;
use crate::error::Result;
use crate::executor::{Executor, ProcessExecutor};
use crate::report::{
    AttributeReport, CountParser, DatasetInfo, GlobalAttributes, GridReport, GriddesParser,
    InfoTable, InfoTableParser, NameList, NamesParser, Parser, ParserRegistry, Report,
    ShowattsParser, ShowattsglobParser, SinfoParser, Timeline, TimelineParser, ToolVersion,
    VctParser, VersionParser, VerticalCoordinateTable, ZaxisReport, ZaxisdesParser,
};

#[cfg(feature = "config")]
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Cdo<E: Executor = ProcessExecutor> {
    synthesizer: Synthesizer,
    executor: E,
    registry: ParserRegistry,
}

impl Default for Cdo<ProcessExecutor> {
    fn default() -> Self {
        Cdo::new()
    }
}

impl Cdo<ProcessExecutor> {
    /// Session running the default `cdo` binary as a child process
    pub fn new() -> Self {
        Cdo::with_executor(ProcessExecutor::new())
    }

    /// Session configured from a `Config`, including its variant overrides
    #[cfg(feature = "config")]
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Cdo::with_executor(ProcessExecutor::new())
            .with_synthesizer(config.synthesizer()?)
            .with_registry(config.registry()?))
    }
}

impl<E: Executor> Cdo<E> {
    pub fn with_executor(executor: E) -> Self {
        Cdo {
            synthesizer: Synthesizer::default(),
            executor,
            registry: ParserRegistry::with_defaults(),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// The command line `expr` would run, without running it
    pub fn command(&self, expr: impl Into<Expr>) -> Result<String> {
        let expr: Expr = expr.into();
        self.synthesizer.synthesize(&expr)
    }

    /// Run a data-producing expression writing to `output`; returns the tool's text
    pub fn run(&self, expr: impl Into<Expr>, output: &str) -> Result<String> {
        let expr: Expr = expr.into();
        let command = self.synthesizer.synthesize_to(&expr, output)?;
        Ok(self.executor.execute(&command)?)
    }

    /// Append the report operator `kind`, run it and parse through the registry
    pub fn report(&self, kind: &str, expr: impl Into<Expr>) -> Result<Report> {
        let expr: Expr = expr.into();
        let pipeline = expr.into_pipeline().report(kind)?;
        let text = self.execute(&pipeline)?;
        self.registry.parse(kind, &text)
    }

    pub fn sinfo(&self, expr: impl Into<Expr>) -> Result<DatasetInfo> {
        self.terminate(expr, Pipeline::sinfo, &SinfoParser)
    }

    pub fn info(&self, expr: impl Into<Expr>) -> Result<InfoTable> {
        self.terminate(expr, Pipeline::info, &InfoTableParser)
    }

    pub fn griddes(&self, expr: impl Into<Expr>) -> Result<GridReport> {
        self.terminate(expr, Pipeline::griddes, &GriddesParser)
    }

    pub fn zaxisdes(&self, expr: impl Into<Expr>) -> Result<ZaxisReport> {
        self.terminate(expr, Pipeline::zaxisdes, &ZaxisdesParser)
    }

    pub fn showname(&self, expr: impl Into<Expr>) -> Result<NameList> {
        self.terminate(expr, Pipeline::showname, &NamesParser)
    }

    pub fn showdate(&self, expr: impl Into<Expr>) -> Result<Timeline> {
        self.terminate(expr, Pipeline::showdate, &TimelineParser)
    }

    /// Number of timesteps
    pub fn ntime(&self, expr: impl Into<Expr>) -> Result<u64> {
        Ok(self.terminate(expr, Pipeline::ntime, &CountParser)?.value)
    }

    /// Number of variables
    pub fn nvar(&self, expr: impl Into<Expr>) -> Result<u64> {
        Ok(self.terminate(expr, Pipeline::nvar, &CountParser)?.value)
    }

    pub fn showatts(&self, expr: impl Into<Expr>) -> Result<AttributeReport> {
        self.terminate(expr, Pipeline::showatts, &ShowattsParser)
    }

    pub fn showattsglob(&self, expr: impl Into<Expr>) -> Result<GlobalAttributes> {
        self.terminate(expr, Pipeline::showattsglob, &ShowattsglobParser)
    }

    pub fn vct(&self, expr: impl Into<Expr>) -> Result<VerticalCoordinateTable> {
        self.terminate(expr, Pipeline::vct, &VctParser)
    }

    /// Version of the tool behind this session's invocation
    pub fn version(&self) -> Result<ToolVersion> {
        let command = format!("{} -V", self.synthesizer.invocation());
        log::debug!("querying version: {}", command);
        let text = self.executor.execute(&command)?;
        Ok(VersionParser.parse(&text)?)
    }

    fn terminate<P: Parser>(
        &self,
        expr: impl Into<Expr>,
        append: fn(&Pipeline) -> Pipeline,
        parser: &P,
    ) -> Result<P::Output> {
        let expr: Expr = expr.into();
        let pipeline = append(&expr.into_pipeline());
        let text = self.execute(&pipeline)?;
        Ok(parser.parse(&text)?)
    }

    fn execute(&self, pipeline: &Pipeline) -> Result<String> {
        let command = self.synthesizer.synthesize(pipeline)?;
        Ok(self.executor.execute(&command)?)
    }
}
