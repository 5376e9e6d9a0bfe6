//! Registry assembling a dispatcher from registered loggers
//!
//! Subsystems register the loggers they own at startup; the application later
//! calls [`Registry::resolve`] to get a dispatcher with every registered
//! logger attached as a child. The registry is an ordinary value: create one
//! at startup and pass it to whoever needs to register or resolve.
//!
//! # Example
//!
//! ```
//! use log_dispatch::{ContractId, EventType, Gate, LogEntry, Logger, MemoryRecords, MemorySink, Registry};
//!
//! let registry = Registry::new();
//! let records = MemoryRecords::default();
//! let shared = records.clone();
//!
//! registry.register_singleton(ContractId::named("memory"), move || {
//!     Ok(Gate::new(MemorySink::with_records("memory", shared.clone())))
//! });
//!
//! let dispatcher = registry.resolve().unwrap();
//! dispatcher.log(&LogEntry::new(EventType::INFORMATION, "ready")).unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert!(std::sync::Arc::ptr_eq(&dispatcher, &registry.resolve().unwrap()));
//! ```

use crate::core::{AggregateFailure, ContractId, DispatchError, Dispatcher, Logger, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

type LoggerFactory = Box<dyn Fn() -> Result<Arc<dyn Logger>> + Send + Sync>;
type DispatcherFactory = Box<dyn Fn() -> Dispatcher + Send + Sync>;

struct Registration {
    contract: ContractId,
    factory: LoggerFactory,
    instance: Option<Arc<dyn Logger>>,
}

impl Registration {
    /// Cached instance, constructing it on first use
    fn instance(&mut self) -> Result<Arc<dyn Logger>> {
        if let Some(ref instance) = self.instance {
            return Ok(Arc::clone(instance));
        }
        let instance = (self.factory)()?;
        debug!(contract = %self.contract, logger = instance.name(), "constructed singleton logger");
        self.instance = Some(Arc::clone(&instance));
        Ok(instance)
    }
}

#[derive(Default)]
struct RegistryState {
    dispatcher_factory: Option<DispatcherFactory>,
    registrations: Vec<Registration>,
    dispatcher: Option<Arc<Dispatcher>>,
    /// Instances replaced by a re-registration, awaiting dispose
    retired: Vec<(ContractId, Arc<dyn Logger>)>,
}

impl RegistryState {
    fn upsert(&mut self, registration: Registration) {
        match self
            .registrations
            .iter_mut()
            .find(|r| r.contract == registration.contract)
        {
            Some(existing) => {
                let previous = std::mem::replace(existing, registration);
                if let Some(instance) = previous.instance {
                    let reused = existing
                        .instance
                        .as_ref()
                        .is_some_and(|current| Arc::ptr_eq(current, &instance));
                    if !reused {
                        self.retired.push((previous.contract, instance));
                    }
                }
            }
            None => self.registrations.push(registration),
        }
    }
}

/// Dispose `loggers`, recording each failure under its contract
fn dispose_each(loggers: Vec<(ContractId, Arc<dyn Logger>)>, failures: &mut AggregateFailure) {
    for (contract, logger) in loggers {
        if let Err(e) = logger.dispose() {
            failures.record(contract, logger.name(), e);
        }
    }
}

/// Factory of loggers and of the dispatcher that fans out to them
///
/// Factories run while the registry's lock is held and must not call back
/// into the same registry. Children are attached to the dispatcher after the
/// lock is released, so the registry lock is never held together with a
/// dispatcher's lock and sinks may query the registry while logging. A sink
/// must still not call [`resolve`](Registry::resolve) on the registry that
/// owns its dispatcher, since the dispatcher's lock is held during fan-out.
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
    /// Serializes attaching children so a stale instance is never reattached
    resolving: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how the dispatcher is constructed; the latest call wins
    ///
    /// A dispatcher already resolved is forgotten, so the next
    /// [`resolve`](Registry::resolve) builds a new one from `factory`.
    pub fn register_dispatcher_type<F>(&self, factory: F)
    where
        F: Fn() -> Dispatcher + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        state.dispatcher_factory = Some(Box::new(factory));
        state.dispatcher = None;
        debug!("registered dispatcher factory");
    }

    /// Register a lazily constructed singleton for `contract`
    ///
    /// The first resolution calls `factory` and caches the instance; later
    /// resolutions return the cached instance. Registering a contract again
    /// replaces the registration and forgets its cached instance.
    pub fn register_singleton<T, F>(&self, contract: ContractId, factory: F)
    where
        T: Logger + 'static,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        debug!(%contract, "registered singleton logger");
        self.state.lock().upsert(Registration {
            contract,
            factory: Box::new(move || -> Result<Arc<dyn Logger>> {
                let logger = factory()?;
                Ok(Arc::new(logger))
            }),
            instance: None,
        });
    }

    /// Register `T::default()` as the singleton for `T`'s own contract
    pub fn register_singleton_type<T>(&self) -> ContractId
    where
        T: Logger + Default + 'static,
    {
        let contract = ContractId::of::<T>();
        self.register_singleton(contract.clone(), || Ok(T::default()));
        contract
    }

    /// Register an already constructed logger for `contract`
    pub fn register_instance(&self, contract: ContractId, logger: Arc<dyn Logger>) {
        debug!(%contract, logger = logger.name(), "registered logger instance");
        let shared = Arc::clone(&logger);
        self.state.lock().upsert(Registration {
            contract,
            factory: Box::new(move || -> Result<Arc<dyn Logger>> { Ok(Arc::clone(&shared)) }),
            instance: Some(logger),
        });
    }

    pub fn is_registered(&self, contract: &ContractId) -> bool {
        self.state
            .lock()
            .registrations
            .iter()
            .any(|r| &r.contract == contract)
    }

    /// Registered contracts in registration order
    pub fn contracts(&self) -> Vec<ContractId> {
        self.state
            .lock()
            .registrations
            .iter()
            .map(|r| r.contract.clone())
            .collect()
    }

    /// Resolve the singleton registered for `contract`
    pub fn resolve_logger(&self, contract: &ContractId) -> Result<Arc<dyn Logger>> {
        let mut state = self.state.lock();
        let registration = state
            .registrations
            .iter_mut()
            .find(|r| &r.contract == contract)
            .ok_or_else(|| DispatchError::not_registered(contract.clone()))?;
        registration.instance()
    }

    /// The dispatcher with every registered singleton attached
    ///
    /// The dispatcher itself is built once and cached. Each call attaches
    /// loggers registered (or re-registered) since the previous call, so the
    /// returned dispatcher always reflects the current registrations.
    /// Instances replaced by a re-registration are detached and disposed;
    /// their dispose failures are returned as an aggregate.
    pub fn resolve(&self) -> Result<Arc<Dispatcher>> {
        let _resolving = self.resolving.lock();
        let (dispatcher, current, retired) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let dispatcher = match state.dispatcher {
                Some(ref dispatcher) => Arc::clone(dispatcher),
                None => {
                    let dispatcher = Arc::new(match state.dispatcher_factory {
                        Some(ref factory) => factory(),
                        None => Dispatcher::default(),
                    });
                    debug!(dispatcher = dispatcher.name(), "constructed dispatcher");
                    state.dispatcher = Some(Arc::clone(&dispatcher));
                    dispatcher
                }
            };

            let current = state
                .registrations
                .iter_mut()
                .map(|r| -> Result<(ContractId, Arc<dyn Logger>)> {
                    Ok((r.contract.clone(), r.instance()?))
                })
                .collect::<Result<Vec<_>>>()?;

            (dispatcher, current, std::mem::take(&mut state.retired))
        };

        for (contract, logger) in current {
            if !dispatcher.holds(&contract, &logger) {
                dispatcher.add_child(contract, logger);
            }
        }

        let mut failures = AggregateFailure::new();
        dispose_each(retired, &mut failures);
        failures.into_result()?;
        Ok(dispatcher)
    }

    /// Dispose the resolved dispatcher and every constructed singleton
    ///
    /// Loggers already disposed through the dispatcher are skipped by their
    /// own dispose-once guard. Failures are aggregated per contract.
    pub fn dispose(&self) -> Result<()> {
        let _resolving = self.resolving.lock();
        let (dispatcher, loggers) = {
            let mut state = self.state.lock();
            let mut loggers = std::mem::take(&mut state.retired);
            loggers.extend(state.registrations.iter().filter_map(|r| {
                r.instance
                    .as_ref()
                    .map(|logger| (r.contract.clone(), Arc::clone(logger)))
            }));
            (state.dispatcher.take(), loggers)
        };

        let mut failures = AggregateFailure::new();
        if let Some(dispatcher) = dispatcher {
            match dispatcher.dispose() {
                Ok(()) => {}
                Err(DispatchError::Aggregate(aggregate)) => failures.merge(aggregate),
                Err(e) => failures.record(ContractId::of::<Dispatcher>(), dispatcher.name(), e),
            }
        }
        dispose_each(loggers, &mut failures);

        failures.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventType, Gate, LogEntry};
    use crate::sinks::MemorySink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_resolve_without_registrations() {
        let registry = Registry::new();
        let dispatcher = registry.resolve().unwrap();
        assert_eq!(dispatcher.child_count(), 0);
        dispatcher
            .log(&LogEntry::new(EventType::INFORMATION, "nobody listens"))
            .unwrap();
    }

    #[test]
    fn test_unregistered_contract_fails() {
        let registry = Registry::new();
        let err = registry
            .resolve_logger(&ContractId::named("missing"))
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::NotRegistered { .. }));
    }

    #[test]
    fn test_singleton_constructed_once() {
        let registry = Registry::new();
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let contract = ContractId::named("memory");

        registry.register_singleton(contract.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Gate::new(MemorySink::default()))
        });

        let first = registry.resolve_logger(&contract).unwrap();
        let second = registry.resolve_logger(&contract).unwrap();
        registry.resolve().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_singleton_type() {
        let registry = Registry::new();
        let contract = registry.register_singleton_type::<Gate<MemorySink>>();

        assert_eq!(contract, ContractId::of::<Gate<MemorySink>>());
        assert!(registry.is_registered(&contract));
        assert_eq!(registry.resolve_logger(&contract).unwrap().name(), "memory");
    }

    #[test]
    fn test_latest_dispatcher_registration_wins() {
        let registry = Registry::new();
        registry.register_dispatcher_type(|| Dispatcher::new("first"));
        registry.register_dispatcher_type(|| Dispatcher::new("second"));

        assert_eq!(registry.resolve().unwrap().name(), "second");
    }

    #[test]
    fn test_late_registration_is_attached() {
        let registry = Registry::new();
        registry.register_singleton(ContractId::named("a"), || Ok(Gate::new(MemorySink::new("a"))));
        let dispatcher = registry.resolve().unwrap();
        assert_eq!(dispatcher.child_count(), 1);

        registry.register_singleton(ContractId::named("b"), || Ok(Gate::new(MemorySink::new("b"))));
        let again = registry.resolve().unwrap();

        assert!(Arc::ptr_eq(&dispatcher, &again));
        assert_eq!(
            again.contracts(),
            vec![ContractId::named("a"), ContractId::named("b")]
        );
    }

    #[test]
    fn test_factory_failure_is_reported() {
        let registry = Registry::new();
        registry.register_singleton(ContractId::named("broken"), || -> Result<Gate<MemorySink>> {
            Err(DispatchError::other("cannot open sink"))
        });

        assert!(registry.resolve().is_err());
    }

    #[test]
    fn test_replaced_instance_is_disposed() {
        let registry = Registry::new();
        let contract = ContractId::named("x");
        let first: Arc<dyn Logger> = Arc::new(Gate::new(MemorySink::new("first")));

        registry.register_instance(contract.clone(), Arc::clone(&first));
        registry.resolve().unwrap();

        registry.register_singleton(contract.clone(), || Ok(Gate::new(MemorySink::new("second"))));
        assert!(!first.is_disposed());

        let dispatcher = registry.resolve().unwrap();
        assert!(first.is_disposed());
        assert_eq!(dispatcher.child(&contract).unwrap().name(), "second");
    }

    #[test]
    fn test_registering_same_instance_keeps_it_alive() {
        let registry = Registry::new();
        let contract = ContractId::named("same");
        let logger: Arc<dyn Logger> = Arc::new(Gate::new(MemorySink::new("same")));

        registry.register_instance(contract.clone(), Arc::clone(&logger));
        registry.register_instance(contract.clone(), Arc::clone(&logger));
        registry.resolve().unwrap();

        assert!(!logger.is_disposed());
    }

    #[test]
    fn test_dispose_reaches_instances_never_attached() {
        let registry = Registry::new();
        let contract = ContractId::named("orphan");
        registry.register_singleton(contract.clone(), || Ok(Gate::new(MemorySink::new("orphan"))));
        let orphan = registry.resolve_logger(&contract).unwrap();

        registry.register_singleton(contract, || Ok(Gate::new(MemorySink::new("fresh"))));
        registry.dispose().unwrap();

        assert!(orphan.is_disposed());
    }

    #[test]
    fn test_sink_may_query_registry_while_dispatching() {
        struct Reentrant {
            registry: Arc<Registry>,
            resolved: Arc<AtomicUsize>,
        }

        impl crate::core::Sink for Reentrant {
            fn internal_log(&mut self, _entry: &LogEntry) -> Result<()> {
                self.registry.resolve_logger(&ContractId::named("reentrant"))?;
                self.resolved.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }

            fn name(&self) -> &str {
                "reentrant"
            }
        }

        let registry = Arc::new(Registry::new());
        let resolved = Arc::new(AtomicUsize::new(0));
        registry.register_instance(
            ContractId::named("reentrant"),
            Arc::new(Gate::new(Reentrant {
                registry: Arc::clone(&registry),
                resolved: Arc::clone(&resolved),
            })),
        );

        let dispatcher = registry.resolve().unwrap();
        dispatcher
            .log(&LogEntry::new(EventType::INFORMATION, "loop"))
            .unwrap();
        assert_eq!(resolved.load(Ordering::SeqCst), 1);
    }
}
