//! FILENAME: core/script-host/src/context.rs
//! PURPOSE: The isolated execution context a loaded script runs in.
//! CONTEXT: One context per load call, bound to exactly one capability set
//! and never shared between two top-level scripts. After execution the
//! context exposes the script's top-level bindings and its module.exports
//! object; async entry points settle through a PendingValue driven by the
//! host pump.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rquickjs::function::This;
use rquickjs::{CatchResultExt, Context, Ctx, Function, Object, Value};

use crate::convert::{error_detail, js_to_json, json_to_js};
use crate::error::ScriptHostError;

// ============================================================================
// SETTLEMENT
// ============================================================================

/// Outcome of an asynchronous script call.
#[derive(Debug, Clone, PartialEq)]
pub enum SettledValue {
    /// The call resolved; the value is carried as its JSON image.
    Resolved(serde_json::Value),
    /// The call rejected; the diagnostic carries message and stack.
    Rejected(String),
}

/// A script call in flight. The slot fills when the underlying promise
/// settles; drive the host pump until then.
pub struct PendingValue {
    slot: Rc<RefCell<Option<SettledValue>>>,
}

impl PendingValue {
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Take the settled outcome, leaving the slot empty.
    pub fn take(&self) -> Option<SettledValue> {
        self.slot.borrow_mut().take()
    }
}

impl std::fmt::Debug for PendingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingValue")
            .field("settled", &self.is_settled())
            .finish()
    }
}

// ============================================================================
// EXECUTION CONTEXT
// ============================================================================

pub struct ScriptContext {
    context: Context,
    path: PathBuf,
    capability_names: Vec<String>,
}

impl std::fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptContext")
            .field("path", &self.path)
            .field("capabilities", &self.capability_names)
            .finish()
    }
}

impl ScriptContext {
    pub(crate) fn new(context: Context, path: PathBuf, capability_names: Vec<String>) -> Self {
        ScriptContext {
            context,
            path,
            capability_names,
        }
    }

    /// The source path the context was loaded from, used in diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The capability names this context was seeded with, in install order.
    pub fn capability_names(&self) -> &[String] {
        &self.capability_names
    }

    /// Whether the script bound `name` as a callable export, either as a
    /// top-level function or on module.exports.
    pub fn has_export(&self, name: &str) -> bool {
        self.context
            .with(|ctx| lookup_export(&ctx, name).is_some())
    }

    /// Evaluate an expression in this context and return its JSON image.
    /// Intended for probes and tests, not for loading module source.
    pub fn eval_json(&self, source: &str) -> Result<serde_json::Value, ScriptHostError> {
        self.context.with(|ctx| {
            let value: Value = ctx.eval(source).catch(&ctx).map_err(|e| {
                ScriptHostError::Script {
                    path: self.path.clone(),
                    detail: e.to_string(),
                }
            })?;
            Ok(js_to_json(&ctx, &value))
        })
    }

    /// Call an exported entry point with one JSON argument and wire its
    /// result for settlement.
    ///
    /// When `self_key` is given and the argument is an object, the context's
    /// own module.exports object is attached under that key, so the callee
    /// receives a live reference to what it exported.
    ///
    /// A non-thenable return settles immediately; a thenable settles when
    /// the host pump drives its handlers.
    pub fn begin_async_call(
        &self,
        name: &str,
        arg: &serde_json::Value,
        self_key: Option<&str>,
    ) -> Result<PendingValue, ScriptHostError> {
        self.context
            .with(|ctx| begin_call(ctx, &self.path, name, arg, self_key))
    }
}

fn script_error(path: &Path, detail: impl std::fmt::Display) -> ScriptHostError {
    ScriptHostError::Script {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Resolve a callable export: a top-level binding first, then
/// module.exports.
fn lookup_export<'js>(ctx: &Ctx<'js>, name: &str) -> Option<Function<'js>> {
    let global: Option<Function> = ctx
        .globals()
        .get::<_, Value>(name)
        .ok()
        .and_then(|v| v.into_function());
    if global.is_some() {
        return global;
    }
    ctx.globals()
        .get::<_, Object>("module")
        .ok()
        .and_then(|m| m.get::<_, Object>("exports").ok())
        .and_then(|e| e.get::<_, Value>(name).ok())
        .and_then(|v| v.into_function())
}

fn begin_call<'js>(
    ctx: Ctx<'js>,
    path: &Path,
    name: &str,
    arg: &serde_json::Value,
    self_key: Option<&str>,
) -> Result<PendingValue, ScriptHostError> {
    let func = lookup_export(&ctx, name).ok_or_else(|| ScriptHostError::MissingExport {
        name: name.to_string(),
        path: path.to_path_buf(),
    })?;

    let arg_value = json_to_js(&ctx, arg)
        .catch(&ctx)
        .map_err(|e| script_error(path, e))?;
    if let (Some(key), Some(obj)) = (self_key, arg_value.as_object()) {
        let exports: Option<Value> = ctx
            .globals()
            .get::<_, Object>("module")
            .ok()
            .and_then(|m| m.get::<_, Value>("exports").ok());
        if let Some(exports) = exports {
            obj.set(key, exports)
                .catch(&ctx)
                .map_err(|e| script_error(path, e))?;
        }
    }

    let ret: Value = func
        .call((arg_value,))
        .catch(&ctx)
        .map_err(|e| script_error(path, e))?;

    let slot: Rc<RefCell<Option<SettledValue>>> = Rc::new(RefCell::new(None));
    let thenable = ret
        .as_object()
        .and_then(|o| o.get::<_, Value>("then").ok())
        .and_then(|t| t.into_function());
    match thenable {
        Some(then) => {
            let ok_slot = Rc::clone(&slot);
            let on_ok = Function::new(ctx.clone(), move |c: Ctx<'js>, v: Value<'js>| {
                *ok_slot.borrow_mut() = Some(SettledValue::Resolved(js_to_json(&c, &v)));
            })
            .catch(&ctx)
            .map_err(|e| script_error(path, e))?;
            let err_slot = Rc::clone(&slot);
            let on_err = Function::new(ctx.clone(), move |c: Ctx<'js>, v: Value<'js>| {
                *err_slot.borrow_mut() = Some(SettledValue::Rejected(error_detail(&c, &v)));
            })
            .catch(&ctx)
            .map_err(|e| script_error(path, e))?;
            then.call::<_, ()>((This(ret.clone()), on_ok, on_err))
                .catch(&ctx)
                .map_err(|e| script_error(path, e))?;
        }
        None => {
            *slot.borrow_mut() = Some(SettledValue::Resolved(js_to_json(&ctx, &ret)));
        }
    }
    Ok(PendingValue { slot })
}
