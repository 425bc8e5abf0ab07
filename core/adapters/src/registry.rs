//! FILENAME: core/adapters/src/registry.rs
//! PURPOSE: Named adapter registry and the start operation.
//! CONTEXT: The registry owns every adapter descriptor and its loaded
//! handle. Starting a scripted adapter loads its source through the script
//! host, stores the handle, and drives the exported initialize entry point
//! to settlement. Initialization failures are a local-recovery boundary:
//! reported, never re-raised.

use std::collections::HashMap;
use std::time::Duration;

use script_host::{CapabilitySet, PumpOutcome, ScriptContext, ScriptHost, SettledValue};

use crate::chain::{ChainAdapter, ChainAdapterConstructor};
use crate::descriptor::{AdapterDescriptor, HandlerConfig};
use crate::error::AdapterError;

enum AdapterEntry {
    Scripted(AdapterDescriptor),
    Builtin(BuiltinAdapter),
}

struct BuiltinAdapter {
    config: HandlerConfig,
    constructor: ChainAdapterConstructor,
    instance: Option<Box<dyn ChainAdapter>>,
}

/// Registry of named database/chain adapters.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: HashMap<String, AdapterEntry>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry::default()
    }

    /// Register a scripted adapter, replacing any previous entry of the
    /// same name.
    pub fn register(&mut self, descriptor: AdapterDescriptor) {
        self.entries
            .insert(descriptor.name().to_string(), AdapterEntry::Scripted(descriptor));
    }

    /// Register a compiled-in adapter under `name`. The constructor runs on
    /// `start`, receiving the capability set and the handler configuration.
    pub fn register_builtin(
        &mut self,
        name: &str,
        config: HandlerConfig,
        constructor: ChainAdapterConstructor,
    ) {
        self.entries.insert(
            name.to_string(),
            AdapterEntry::Builtin(BuiltinAdapter {
                config,
                constructor,
                instance: None,
            }),
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered adapter names, sorted for stable reporting.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// The descriptor of a scripted adapter, if one is registered.
    pub fn descriptor(&self, name: &str) -> Option<&AdapterDescriptor> {
        match self.entries.get(name) {
            Some(AdapterEntry::Scripted(descriptor)) => Some(descriptor),
            _ => None,
        }
    }

    /// The constructed instance of a compiled-in adapter, if started.
    pub fn chain_adapter(&self, name: &str) -> Option<&dyn ChainAdapter> {
        match self.entries.get(name) {
            Some(AdapterEntry::Builtin(builtin)) => builtin.instance.as_deref(),
            _ => None,
        }
    }

    /// Start the named adapter.
    ///
    /// Scripted adapters: the script is loaded with the shared capability
    /// set (never the environment self-reference), the handle is stored
    /// unconditionally before initialization so later calls can find it,
    /// and the exported `initialize(descriptor)` is driven to settlement.
    /// A resolution reports the adapter's own verdict; a rejection is
    /// logged with the adapter name and full diagnostic and reported as
    /// `false`. Load failures (unreadable source, parse or runtime errors)
    /// propagate to the caller.
    ///
    /// Compiled-in adapters construct their instance and report `true`.
    pub fn start(
        &mut self,
        name: &str,
        host: &ScriptHost,
        capabilities: &CapabilitySet,
        timeout: Option<Duration>,
    ) -> Result<bool, AdapterError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| AdapterError::NotFound {
                name: name.to_string(),
            })?;

        match entry {
            AdapterEntry::Builtin(builtin) => {
                builtin.instance =
                    Some((builtin.constructor)(capabilities.clone(), builtin.config.clone()));
                log::info!("adapter {} constructed", name);
                Ok(true)
            }
            AdapterEntry::Scripted(descriptor) => {
                let context = host.load(descriptor.script_path(), capabilities)?;
                descriptor.install_handle(context);
                let argument = descriptor.descriptor_json();
                let handle = match descriptor.handle() {
                    Some(handle) => handle,
                    None => return Ok(false),
                };
                Ok(run_initialize(name, host, handle, &argument, timeout))
            }
        }
    }
}

/// Drive `initialize(descriptor)` to settlement and fold the outcome into
/// the informational boolean.
fn run_initialize(
    name: &str,
    host: &ScriptHost,
    handle: &ScriptContext,
    argument: &serde_json::Value,
    timeout: Option<Duration>,
) -> bool {
    let pending = match handle.begin_async_call("initialize", argument, Some("adapter")) {
        Ok(pending) => pending,
        Err(err) => {
            log::error!("adapter {} initialize call failed: {}", name, err);
            return false;
        }
    };
    match host.await_pending(&pending, timeout) {
        PumpOutcome::Satisfied => match pending.take() {
            Some(SettledValue::Resolved(value)) => {
                let reported = match value {
                    serde_json::Value::Bool(b) => b,
                    other => {
                        log::warn!(
                            "adapter {} initialize resolved to a non-boolean ({}), coercing",
                            name,
                            other
                        );
                        script_host::json_truthy(&other)
                    }
                };
                log::info!("adapter {} initialized (reported {})", name, reported);
                reported
            }
            Some(SettledValue::Rejected(detail)) => {
                log::error!("adapter {} failed to initialize: {}", name, detail);
                false
            }
            None => false,
        },
        PumpOutcome::TimedOut => {
            log::error!("adapter {} initialize timed out", name);
            false
        }
        PumpOutcome::Exhausted => {
            log::error!(
                "adapter {} initialize can never settle: no runnable work remains",
                name
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Balance, ContractCall, ContractResult, Transaction, TransactionReceipt};
    use std::fs;
    use std::path::PathBuf;

    fn write_script(dir: &tempfile::TempDir, name: &str, source: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, source).expect("write script");
        path
    }

    fn scripted(dir: &tempfile::TempDir, name: &str, source: &str) -> AdapterDescriptor {
        let path = write_script(dir, &format!("{}.js", name), source);
        AdapterDescriptor::new(name, &path, "bin/{platform}/db.node", HandlerConfig::default())
    }

    #[test]
    fn test_start_unknown_adapter_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        let err = registry
            .start("sqlite3", &host, &CapabilitySet::standard(dir.path()), None)
            .expect_err("must fail");
        match err {
            AdapterError::NotFound { name } => assert_eq!(name, "sqlite3"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_start_resolving_adapter_reports_value_and_stores_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        registry.register(scripted(
            &dir,
            "sqlite3",
            "async function initialize(descriptor) { return true; }",
        ));
        let started = registry
            .start("sqlite3", &host, &CapabilitySet::standard(dir.path()), None)
            .expect("start");
        assert!(started);
        assert!(registry.descriptor("sqlite3").expect("descriptor").is_loaded());
    }

    #[test]
    fn test_rejecting_initialize_reports_false_without_raising() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        registry.register(scripted(
            &dir,
            "sqlite3",
            "async function initialize(d) { throw new Error('corrupt database'); }",
        ));
        let started = registry
            .start("sqlite3", &host, &CapabilitySet::standard(dir.path()), None)
            .expect("start must not raise");
        assert!(!started);
        // the handle was stored before initialization failed
        assert!(registry.descriptor("sqlite3").expect("descriptor").is_loaded());
    }

    #[test]
    fn test_unreadable_script_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        registry.register(AdapterDescriptor::new(
            "sqlite3",
            &dir.path().join("absent.js"),
            "bin/db.node",
            HandlerConfig::default(),
        ));
        let err = registry
            .start("sqlite3", &host, &CapabilitySet::standard(dir.path()), None)
            .expect_err("must fail");
        assert!(matches!(
            err,
            AdapterError::Host(script_host::ScriptHostError::Io { .. })
        ));
        assert!(!registry.descriptor("sqlite3").expect("descriptor").is_loaded());
    }

    #[test]
    fn test_descriptor_argument_reaches_initialize() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        let path = write_script(
            &dir,
            "sqlite3.js",
            r#"
            module.exports.kind = 'database';
            async function initialize(descriptor) {
                return descriptor.name === 'sqlite3'
                    && descriptor.script.indexOf('sqlite3.js') >= 0
                    && descriptor.config.file === 'wallet.db'
                    && descriptor.adapter.kind === 'database';
            }
            "#,
        );
        registry.register(AdapterDescriptor::new(
            "sqlite3",
            &path,
            "bin/{platform}/sqlite3.node",
            HandlerConfig(serde_json::json!({"file": "wallet.db"})),
        ));
        let started = registry
            .start("sqlite3", &host, &CapabilitySet::standard(dir.path()), None)
            .expect("start");
        assert!(started, "descriptor argument was incomplete");
    }

    #[test]
    fn test_non_boolean_resolution_is_coerced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        registry.register(scripted(
            &dir,
            "truthy",
            "async function initialize(d) { return 'ready'; }",
        ));
        registry.register(scripted(
            &dir,
            "falsy",
            "async function initialize(d) { return 0; }",
        ));
        let set = CapabilitySet::standard(dir.path());
        assert!(registry.start("truthy", &host, &set, None).expect("start"));
        assert!(!registry.start("falsy", &host, &set, None).expect("start"));
    }

    #[test]
    fn test_restart_replaces_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        registry.register(scripted(
            &dir,
            "sqlite3",
            r#"
            var calls = 0;
            async function initialize(d) { calls += 1; return calls === 1; }
            "#,
        ));
        let set = CapabilitySet::standard(dir.path());
        assert!(registry.start("sqlite3", &host, &set, None).expect("start"));
        // a fresh context counts from zero again: the handle was replaced
        assert!(registry.start("sqlite3", &host, &set, None).expect("restart"));
    }

    struct FixedAdapter {
        name: String,
        config: HandlerConfig,
    }

    impl ChainAdapter for FixedAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn balance(&self, account: &str) -> Result<Balance, AdapterError> {
            Ok(Balance {
                account: account.to_string(),
                amount: "1000".to_string(),
            })
        }

        fn submit_transaction(
            &self,
            transaction: &Transaction,
        ) -> Result<TransactionReceipt, AdapterError> {
            Ok(TransactionReceipt {
                id: format!("{}->{}", transaction.from, transaction.to),
                accepted: true,
            })
        }

        fn call_contract(&self, call: &ContractCall) -> Result<ContractResult, AdapterError> {
            if call.method.is_empty() {
                return Err(AdapterError::Chain {
                    adapter: self.name.clone(),
                    operation: "call_contract".to_string(),
                    detail: "empty method".to_string(),
                });
            }
            Ok(ContractResult {
                value: self.config.0.clone(),
            })
        }
    }

    #[test]
    fn test_builtin_adapter_constructs_on_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let host = ScriptHost::new().expect("host");
        let mut registry = AdapterRegistry::new();
        registry.register_builtin(
            "memory",
            HandlerConfig(serde_json::json!({"kind": "memory"})),
            Box::new(|_capabilities, config| {
                Box::new(FixedAdapter {
                    name: "memory".to_string(),
                    config,
                })
            }),
        );
        assert!(registry.chain_adapter("memory").is_none());
        let started = registry
            .start("memory", &host, &CapabilitySet::standard(dir.path()), None)
            .expect("start");
        assert!(started);

        let adapter = registry.chain_adapter("memory").expect("instance");
        assert_eq!(adapter.name(), "memory");
        let balance = adapter.balance("alice").expect("balance");
        assert_eq!(balance.amount, "1000");
        let receipt = adapter
            .submit_transaction(&Transaction {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: "5".to_string(),
                payload: serde_json::Value::Null,
            })
            .expect("submit");
        assert!(receipt.accepted);
        let result = adapter
            .call_contract(&ContractCall {
                contract: "token".to_string(),
                method: "totalSupply".to_string(),
                arguments: serde_json::Value::Null,
            })
            .expect("call");
        assert_eq!(result.value["kind"], "memory");
    }
}
