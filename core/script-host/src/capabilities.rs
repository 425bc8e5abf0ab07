//! FILENAME: core/script-host/src/capabilities.rs
//! PURPOSE: The closed capability whitelist injected into loaded contexts.
//! CONTEXT: A loaded script can reach exactly the host facilities named in
//! its CapabilitySet and nothing else. Each entry installs one global
//! symbol; the set is ordered so the audit surface reads as one static
//! list. Language intrinsics (Object, JSON, Promise, ...) are part of the
//! engine, not host facilities, and are always present.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use rquickjs::function::{Opt, Rest};
use rquickjs::{Context, Ctx, Exception, Function, IntoJs, Object, Persistent, TypedArray, Value};

use crate::convert::display_value;
use crate::timers::SharedTimerQueue;

// ============================================================================
// CAPABILITY CONTRACT
// ============================================================================

/// Everything an installer may need while seeding one context.
pub struct InstallSite<'a, 'js> {
    /// The live context being seeded.
    pub ctx: &'a Ctx<'js>,
    /// The global symbol name this entry was registered under.
    pub name: &'a str,
    /// Owning handle of the context, for capabilities that must call back
    /// into it later (timers).
    pub context: &'a Context,
    /// The host timer queue.
    pub timers: &'a SharedTimerQueue,
}

/// One host facility exposed to scripts under a fixed global name.
pub trait Capability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()>;
}

// ============================================================================
// CAPABILITY SET
// ============================================================================

/// Ordered mapping of global symbol name to capability installer.
///
/// Immutable in normal use once constructed; `extended` produces a widened
/// copy for the one caller that injects the environment self-reference.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    entries: Vec<(String, Rc<dyn Capability>)>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        CapabilitySet::default()
    }

    /// The standard mapping shared by every loaded context: module
    /// resolution, a binary-buffer constructor, the logging sink, the
    /// module-reference object, timer scheduling/cancellation, and the host
    /// process object.
    pub fn standard(module_root: &Path) -> Self {
        CapabilitySet::new()
            .with("require", Rc::new(ModuleResolverCapability::new(module_root)))
            .with("Buffer", Rc::new(BufferCapability))
            .with("console", Rc::new(ConsoleCapability))
            .with("module", Rc::new(ModuleRefCapability))
            .with("setTimeout", Rc::new(SetTimeoutCapability))
            .with("clearTimeout", Rc::new(ClearTimeoutCapability))
            .with("process", Rc::new(ProcessCapability))
    }

    /// Builder-style insert. Replaces an existing entry of the same name so
    /// a mapping never carries two installers for one symbol.
    pub fn with(mut self, name: &str, capability: Rc<dyn Capability>) -> Self {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = capability;
        } else {
            self.entries.push((name.to_string(), capability));
        }
        self
    }

    /// A widened copy carrying one extra entry. The base set is untouched:
    /// contexts seeded from it never observe the addition.
    pub fn extended(&self, name: &str, capability: Rc<dyn Capability>) -> Self {
        self.clone().with(name, capability)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seed a fresh context with every entry, in order.
    pub(crate) fn install_all(
        &self,
        ctx: &Ctx<'_>,
        context: &Context,
        timers: &SharedTimerQueue,
    ) -> Result<(), (String, rquickjs::Error)> {
        for (name, capability) in &self.entries {
            let site = InstallSite {
                ctx,
                name,
                context,
                timers,
            };
            capability
                .install(&site)
                .map_err(|e| (name.clone(), e))?;
        }
        Ok(())
    }
}

// ============================================================================
// STANDARD CAPABILITIES
// ============================================================================

/// Logging sink: console.log/info/warn/error/debug routed into the host
/// diagnostic log under the `script` target.
pub struct ConsoleCapability;

impl Capability for ConsoleCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let console = Object::new(site.ctx.clone())?;
        console.set("log", level_fn(site.ctx, log::Level::Info)?)?;
        console.set("info", level_fn(site.ctx, log::Level::Info)?)?;
        console.set("warn", level_fn(site.ctx, log::Level::Warn)?)?;
        console.set("error", level_fn(site.ctx, log::Level::Error)?)?;
        console.set("debug", level_fn(site.ctx, log::Level::Debug)?)?;
        site.ctx.globals().set(site.name, console)
    }
}

fn level_fn<'js>(ctx: &Ctx<'js>, level: log::Level) -> rquickjs::Result<Function<'js>> {
    Function::new(
        ctx.clone(),
        move |fctx: Ctx<'js>, args: Rest<Value<'js>>| {
            let line = args
                .0
                .iter()
                .map(|v| display_value(&fctx, v))
                .collect::<Vec<_>>()
                .join(" ");
            log::log!(target: "script", level, "{}", line);
        },
    )
}

/// Timer scheduling: setTimeout(callback, delayMs) -> id.
pub struct SetTimeoutCapability;

impl Capability for SetTimeoutCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let timers = Rc::clone(site.timers);
        let context = site.context.clone();
        let f = Function::new(
            site.ctx.clone(),
            move |fctx: Ctx<'js>, callback: Function<'js>, delay: Opt<f64>| {
                let delay_ms = delay.0.unwrap_or(0.0).max(0.0);
                let due = Instant::now() + Duration::from_millis(delay_ms as u64);
                let callback = Persistent::save(&fctx, callback);
                timers.borrow_mut().schedule(context.clone(), due, callback)
            },
        )?;
        site.ctx.globals().set(site.name, f)
    }
}

/// Timer cancellation: clearTimeout(id). Unknown ids are ignored.
pub struct ClearTimeoutCapability;

impl Capability for ClearTimeoutCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let timers = Rc::clone(site.timers);
        let f = Function::new(site.ctx.clone(), move |id: Opt<f64>| {
            if let Some(id) = id.0 {
                timers.borrow_mut().cancel(id as u32);
            }
        })?;
        site.ctx.globals().set(site.name, f)
    }
}

/// Host process object: platform, arch, pid.
pub struct ProcessCapability;

impl Capability for ProcessCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let process = Object::new(site.ctx.clone())?;
        process.set("platform", std::env::consts::OS)?;
        process.set("arch", std::env::consts::ARCH)?;
        process.set("pid", std::process::id())?;
        site.ctx.globals().set(site.name, process)
    }
}

/// Binary-buffer constructor: Buffer.from(string | byte array) and
/// Buffer.alloc(length), both producing Uint8Array values.
pub struct BufferCapability;

impl Capability for BufferCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let buffer = Object::new(site.ctx.clone())?;
        buffer.set(
            "from",
            Function::new(
                site.ctx.clone(),
                |fctx: Ctx<'js>, data: Value<'js>| -> rquickjs::Result<Value<'js>> {
                    let bytes: Vec<u8> = if let Some(s) = data.as_string() {
                        s.to_string()?.into_bytes()
                    } else if let Some(arr) = data.as_array() {
                        let mut out = Vec::with_capacity(arr.len());
                        for item in arr.iter::<f64>() {
                            out.push(item? as u8);
                        }
                        out
                    } else {
                        return Err(Exception::throw_message(
                            &fctx,
                            "Buffer.from expects a string or an array of bytes",
                        ));
                    };
                    TypedArray::new(fctx.clone(), bytes)?.into_js(&fctx)
                },
            )?,
        )?;
        buffer.set(
            "alloc",
            Function::new(
                site.ctx.clone(),
                |fctx: Ctx<'js>, len: f64| -> rquickjs::Result<Value<'js>> {
                    TypedArray::new(fctx.clone(), vec![0u8; len.max(0.0) as usize])?
                        .into_js(&fctx)
                },
            )?,
        )?;
        site.ctx.globals().set(site.name, buffer)
    }
}

/// Module-reference object: a fresh `module` with an empty `exports` bag,
/// letting scripts publish their entry points the way they would under a
/// CommonJS-style loader.
pub struct ModuleRefCapability;

impl Capability for ModuleRefCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let module = Object::new(site.ctx.clone())?;
        module.set("exports", Object::new(site.ctx.clone())?)?;
        site.ctx.globals().set(site.name, module)
    }
}

/// Module-resolution facility rooted at a directory.
///
/// Resolves `.js` sources (executed through a function wrapper inside the
/// requiring context) and `.json` documents. The engine's own loading
/// machinery stays unreachable: only files under the configured root can be
/// resolved, and candidates escaping the root are treated as missing.
pub struct ModuleResolverCapability {
    root: PathBuf,
}

impl ModuleResolverCapability {
    pub fn new(root: &Path) -> Self {
        ModuleResolverCapability {
            root: root.to_path_buf(),
        }
    }

    fn resolve(&self, spec: &str) -> Option<PathBuf> {
        if spec.is_empty() {
            return None;
        }
        let root = self.root.canonicalize().ok()?;
        let base = self.root.join(spec);
        let candidates = [
            base.clone(),
            PathBuf::from(format!("{}.js", base.display())),
            PathBuf::from(format!("{}.json", base.display())),
        ];
        for candidate in candidates {
            if !candidate.is_file() {
                continue;
            }
            if let Ok(canonical) = candidate.canonicalize() {
                if canonical.starts_with(&root) {
                    return Some(canonical);
                }
            }
        }
        None
    }
}

impl Capability for ModuleResolverCapability {
    fn install<'js>(&self, site: &InstallSite<'_, 'js>) -> rquickjs::Result<()> {
        let resolver = ModuleResolverCapability::new(&self.root);
        let own_name = site.name.to_string();
        let f = Function::new(
            site.ctx.clone(),
            move |fctx: Ctx<'js>, spec: String| -> rquickjs::Result<Value<'js>> {
                let path = resolver.resolve(&spec).ok_or_else(|| {
                    Exception::throw_message(&fctx, &format!("module not found: {}", spec))
                })?;
                let source = std::fs::read_to_string(&path).map_err(|e| {
                    Exception::throw_message(
                        &fctx,
                        &format!("module unreadable: {}: {}", path.display(), e),
                    )
                })?;
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    return fctx.json_parse(source);
                }
                let wrapped =
                    format!("(function(module, exports, require){{\n{}\n}})", source);
                let factory: Function = fctx.eval(wrapped)?;
                let module = Object::new(fctx.clone())?;
                let exports = Object::new(fctx.clone())?;
                module.set("exports", exports.clone())?;
                let require: Value = fctx.globals().get(own_name.as_str())?;
                factory.call::<_, ()>((module.clone(), exports, require))?;
                module.get("exports")
            },
        )?;
        site.ctx.globals().set(site.name, f)
    }
}
