//! Dispatcher - a logger that fans out to a set of child loggers

use super::{
    contract::ContractId,
    error::{AggregateFailure, DispatchError, Result},
    filter::Filter,
    log_entry::LogEntry,
    logger::{Gate, Logger},
    metrics::GateMetrics,
    sink::Sink,
};
use crate::config::{DispatchConfig, GateSettings};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name used when a dispatcher is built without one
pub const DEFAULT_DISPATCHER_NAME: &str = "dispatcher";

struct Child {
    contract: ContractId,
    logger: Arc<dyn Logger>,
}

/// Sink half of a dispatcher: the ordered child list
struct FanOut {
    name: String,
    children: Vec<Child>,
}

impl FanOut {
    /// Run `op` on every child in registration order, collecting failures
    fn for_each_child(
        &self,
        operation: &'static str,
        op: impl Fn(&dyn Logger) -> Result<()>,
    ) -> Result<()> {
        let mut failures = AggregateFailure::new();
        for child in &self.children {
            if let Err(e) = op(child.logger.as_ref()) {
                warn!(
                    dispatcher = %self.name,
                    contract = %child.contract,
                    logger = child.logger.name(),
                    operation,
                    error = %e,
                    "child logger failed"
                );
                failures.record(child.contract.clone(), child.logger.name(), e);
            }
        }
        failures.into_result()
    }

    fn position(&self, contract: &ContractId) -> Option<usize> {
        self.children.iter().position(|c| &c.contract == contract)
    }
}

impl Sink for FanOut {
    fn internal_log(&mut self, entry: &LogEntry) -> Result<()> {
        self.for_each_child("log", |child| child.log(entry))
    }

    fn dispose(&mut self) -> Result<()> {
        self.for_each_child("dispose", |child| child.dispose())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A logger that owns child loggers and forwards every admitted entry to each
///
/// The dispatcher applies its own gate once, then calls every child's
/// [`Logger::log`] in registration order so each child applies its own gate.
/// A failing child never stops the others: failures are gathered into one
/// [`AggregateFailure`] returned after every child was attempted. The same
/// holds for [`Logger::dispose`].
///
/// # Example
///
/// ```
/// use log_dispatch::{ContractId, Dispatcher, EventType, Filter, Gate, LogEntry, Logger, MemorySink};
/// use std::sync::Arc;
///
/// let everything = MemorySink::new("everything");
/// let errors = MemorySink::new("errors");
/// let (all_records, error_records) = (everything.records(), errors.records());
///
/// let dispatcher = Dispatcher::new("app");
/// dispatcher.add_child(ContractId::named("everything"), Arc::new(Gate::new(everything)));
/// dispatcher.add_child(
///     ContractId::named("errors"),
///     Arc::new(Gate::new(errors).with_filter(Filter::mask(EventType::ERROR))),
/// );
///
/// dispatcher.log(&LogEntry::new(EventType::INFORMATION, "started")).unwrap();
/// dispatcher.log(&LogEntry::new(EventType::ERROR, "failed")).unwrap();
///
/// assert_eq!(all_records.len(), 2);
/// assert_eq!(error_records.len(), 1);
/// ```
pub struct Dispatcher {
    gate: Gate<FanOut>,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            gate: Gate::new(FanOut {
                name: name.into(),
                children: Vec::new(),
            }),
        }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Register `logger` under `contract`
    ///
    /// A contract already present keeps its position and has its logger
    /// replaced; the previous logger is returned. New contracts are appended.
    pub fn add_child(
        &self,
        contract: ContractId,
        logger: Arc<dyn Logger>,
    ) -> Option<Arc<dyn Logger>> {
        debug!(dispatcher = self.gate.name(), %contract, logger = logger.name(), "adding child logger");
        self.gate.with_sink(|fan_out| match fan_out.position(&contract) {
            Some(idx) => Some(std::mem::replace(&mut fan_out.children[idx].logger, logger)),
            None => {
                fan_out.children.push(Child { contract, logger });
                None
            }
        })
    }

    /// Wrap `logger` in an `Arc` and register it
    pub fn add_logger<L: Logger + 'static>(&self, contract: ContractId, logger: L) -> Arc<dyn Logger> {
        let logger: Arc<dyn Logger> = Arc::new(logger);
        self.add_child(contract, Arc::clone(&logger));
        logger
    }

    /// Detach the child registered under `contract` without disposing it
    pub fn remove_child(&self, contract: &ContractId) -> Option<Arc<dyn Logger>> {
        self.gate.with_sink(|fan_out| {
            fan_out
                .position(contract)
                .map(|idx| fan_out.children.remove(idx).logger)
        })
    }

    pub fn child(&self, contract: &ContractId) -> Option<Arc<dyn Logger>> {
        self.gate.with_sink(|fan_out| {
            fan_out
                .position(contract)
                .map(|idx| Arc::clone(&fan_out.children[idx].logger))
        })
    }

    /// Whether `logger` is the exact instance registered under `contract`
    pub fn holds(&self, contract: &ContractId, logger: &Arc<dyn Logger>) -> bool {
        self.child(contract)
            .is_some_and(|current| Arc::ptr_eq(&current, logger))
    }

    /// Registered contracts in fan-out order
    pub fn contracts(&self) -> Vec<ContractId> {
        self.gate
            .with_sink(|fan_out| fan_out.children.iter().map(|c| c.contract.clone()).collect())
    }

    pub fn child_count(&self) -> usize {
        self.gate.with_sink(|fan_out| fan_out.children.len())
    }

    fn children(&self) -> Vec<(ContractId, Arc<dyn Logger>)> {
        self.gate.with_sink(|fan_out| {
            fan_out
                .children
                .iter()
                .map(|c| (c.contract.clone(), Arc::clone(&c.logger)))
                .collect()
        })
    }

    /// Flush the dispatcher's own buffer, then every child's buffer
    ///
    /// Child failures from both steps are merged into one aggregate.
    pub fn flush_all(&self) -> Result<()> {
        let mut failures = AggregateFailure::new();
        match self.gate.flush_buffer() {
            Ok(()) => {}
            Err(DispatchError::Aggregate(aggregate)) => failures.merge(aggregate),
            Err(e) => return Err(e),
        }
        for (contract, logger) in self.children() {
            if let Err(e) = logger.flush_buffer() {
                failures.record(contract, logger.name(), e);
            }
        }
        failures.into_result()
    }

    /// Apply gate settings to the dispatcher and its named children
    ///
    /// Children are matched by logger name, full contract name, or the
    /// contract's short name. Every name is resolved before anything changes,
    /// so an unknown name leaves all gates untouched.
    pub fn apply_config(&self, config: &DispatchConfig) -> Result<()> {
        let children = self.children();
        let mut targets: Vec<(&GateSettings, Arc<dyn Logger>)> = Vec::with_capacity(config.loggers.len());

        for (name, settings) in &config.loggers {
            let logger = children
                .iter()
                .find(|(contract, logger)| {
                    logger.name() == name
                        || contract.as_str() == name
                        || contract.short_name() == name
                })
                .map(|(_, logger)| Arc::clone(logger))
                .ok_or_else(|| {
                    DispatchError::config(
                        self.gate.name(),
                        format!("no child logger named '{}'", name),
                    )
                })?;
            targets.push((settings, logger));
        }

        config.dispatcher.apply_to(self);
        for (settings, logger) in targets {
            settings.apply_to(logger.as_ref());
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DISPATCHER_NAME)
    }
}

impl Logger for Dispatcher {
    fn name(&self) -> &str {
        self.gate.name()
    }

    fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.gate.set_enabled(enabled)
    }

    fn filter(&self) -> Filter {
        self.gate.filter()
    }

    fn set_filter(&self, filter: Filter) {
        self.gate.set_filter(filter)
    }

    fn log(&self, entry: &LogEntry) -> Result<()> {
        self.gate.log(entry)
    }

    fn log_buffered(&self, entry: &LogEntry) -> Result<()> {
        self.gate.log_buffered(entry)
    }

    fn flush_buffer(&self) -> Result<()> {
        self.gate.flush_buffer()
    }

    fn dispose(&self) -> Result<()> {
        self.gate.dispose()
    }

    fn is_disposed(&self) -> bool {
        self.gate.is_disposed()
    }

    fn buffered_len(&self) -> usize {
        self.gate.buffered_len()
    }

    fn metrics(&self) -> &GateMetrics {
        self.gate.metrics()
    }
}

/// Builder for [`Dispatcher`]
///
/// # Example
///
/// ```
/// use log_dispatch::{ContractId, Dispatcher, EventType, Filter, Gate, Logger, MemorySink};
///
/// let dispatcher = Dispatcher::builder()
///     .name("app")
///     .filter(Filter::any_mask([EventType::WARNING, EventType::ERROR]))
///     .child(ContractId::named("memory"), Gate::new(MemorySink::new("memory")))
///     .build();
///
/// assert_eq!(dispatcher.name(), "app");
/// assert_eq!(dispatcher.child_count(), 1);
/// ```
pub struct DispatcherBuilder {
    name: String,
    enabled: bool,
    filter: Filter,
    children: Vec<(ContractId, Arc<dyn Logger>)>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_DISPATCHER_NAME.to_string(),
            enabled: true,
            filter: Filter::AlwaysPass,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn child<L: Logger + 'static>(self, contract: ContractId, logger: L) -> Self {
        self.shared_child(contract, Arc::new(logger))
    }

    #[must_use]
    pub fn shared_child(mut self, contract: ContractId, logger: Arc<dyn Logger>) -> Self {
        self.children.push((contract, logger));
        self
    }

    pub fn build(self) -> Dispatcher {
        let dispatcher = Dispatcher::new(self.name);
        dispatcher.set_enabled(self.enabled);
        dispatcher.set_filter(self.filter);
        for (contract, logger) in self.children {
            dispatcher.add_child(contract, logger);
        }
        dispatcher
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
