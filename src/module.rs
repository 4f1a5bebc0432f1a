//! Module loading.
//!
//! `import a.b.c;` maps to the relative path `a/b/c.nyx`, which is looked up
//! under each root of a [`SearchPaths`] in order. The first existing file
//! wins. Modules are memoized in a [`ModuleRegistry`] keyed by canonical
//! path: a file is scanned, parsed, resolved and executed at most once, and
//! every later import gets the same [`Module`] back.
//!
//! A module runs in its own child interpreter. Its namespace is that
//! interpreter's global environment.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::ast::dotted;
use crate::environment::EnvRef;
use crate::error::{NyxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// File extension of Nyx sources.
pub const EXTENSION: &str = "nyx";

/// Name of the project-local and per-user library directories.
pub const LIBRARY_DIR: &str = ".nyx";

/// The namespace produced by executing one source file.
pub struct Module {
    name: String,
    path: PathBuf,
    environment: EnvRef,
}

impl Module {
    pub fn new(name: impl Into<String>, path: PathBuf, environment: EnvRef) -> Self {
        Self {
            name: name.into(),
            path,
            environment,
        }
    }

    /// Dotted name as first imported, e.g. `std.math`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn environment(&self) -> EnvRef {
        Rc::clone(&self.environment)
    }

    /// Read a top-level binding of the module.
    pub fn get(&self, name: &Token) -> Result<Value> {
        self.environment
            .borrow()
            .lookup(&name.lexeme)
            .ok_or_else(|| {
                NyxError::runtime(
                    name,
                    format!(
                        "Undefined property '{}' in module '{}'.",
                        name.lexeme, self.name
                    ),
                )
            })
    }

    /// Modules are read-only to importers.
    pub fn set(&self, name: &Token, _value: Value) -> Result<()> {
        Err(NyxError::runtime(name, "Can't set properties on a module."))
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Search paths
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered list of directories an import is resolved against.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    roots: Vec<PathBuf>,
}

impl Default for SearchPaths {
    /// Working directory, then `./.nyx`, then `~/.nyx`.
    fn default() -> Self {
        let mut roots = vec![PathBuf::from("."), PathBuf::from(LIBRARY_DIR)];

        match dirs::home_dir() {
            Some(home) => roots.push(home.join(LIBRARY_DIR)),
            None => warn!("No home directory; skipping per-user library"),
        }

        Self { roots }
    }
}

impl SearchPaths {
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a root. Duplicates are ignored.
    pub fn push<P: Into<PathBuf>>(&mut self, root: P) {
        let root = root.into();
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Every location `relative` would be looked for, in order.
    pub fn candidates(&self, relative: &Path) -> Vec<PathBuf> {
        self.roots.iter().map(|root| root.join(relative)).collect()
    }

    /// First existing candidate, canonicalized when possible.
    pub fn find(&self, relative: &Path) -> Option<PathBuf> {
        self.candidates(relative)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(|found| found.canonicalize().unwrap_or(found))
    }
}

/// `a.b.c` → `a/b/c.nyx`.
pub fn relative_path(path: &[Token]) -> PathBuf {
    let mut relative: PathBuf = path.iter().map(|segment| segment.lexeme.as_str()).collect();
    relative.set_extension(EXTENSION);
    relative
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum ModuleState {
    /// Being loaded; seeing it again means an import cycle.
    Loading,
    Ready(Rc<Module>),
}

/// Memo of loaded modules, shared by an interpreter and every module
/// interpreter it spawns.
#[derive(Debug)]
pub struct ModuleRegistry {
    search: SearchPaths,
    entries: HashMap<PathBuf, ModuleState>,
}

impl ModuleRegistry {
    pub fn new(search: SearchPaths) -> Self {
        Self {
            search,
            entries: HashMap::new(),
        }
    }

    pub fn shared(search: SearchPaths) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(search)))
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search
    }

    pub fn search_paths_mut(&mut self) -> &mut SearchPaths {
        &mut self.search
    }

    /// Has the file at `path` finished loading?
    pub fn is_loaded(&self, path: &Path) -> bool {
        matches!(self.entries.get(path), Some(ModuleState::Ready(_)))
    }

    /// Number of fully loaded modules.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|state| matches!(state, ModuleState::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve, load and memoize the module named by `path`.
///
/// Errors inside the module (syntax, resolution, runtime) are reported to
/// the shared diagnostics where they happen; the importer only sees a
/// "failed to load" error at its `import` keyword.
pub fn load(parent: &Interpreter, keyword: &Token, path: &[Token]) -> Result<Rc<Module>> {
    let name = dotted(path);
    let relative = relative_path(path);
    let registry = parent.modules();

    let found = registry.borrow().search_paths().find(&relative);

    let Some(file) = found else {
        let looked_at = registry
            .borrow()
            .search_paths()
            .candidates(&relative)
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        return Err(NyxError::runtime(
            keyword,
            format!("Could not find module '{}', looked at: {}.", name, looked_at),
        ));
    };

    let state = registry.borrow().entries.get(&file).cloned();

    match state {
        Some(ModuleState::Ready(module)) => {
            debug!("Module '{}' served from cache", name);
            return Ok(module);
        }
        Some(ModuleState::Loading) => {
            return Err(NyxError::runtime(
                keyword,
                format!("Recursive import of module '{}'.", name),
            ));
        }
        None => {}
    }

    info!("Loading module '{}' from {}", name, file.display());

    registry
        .borrow_mut()
        .entries
        .insert(file.clone(), ModuleState::Loading);

    let outcome = execute_file(parent, &file);

    let environment = match outcome {
        Ok(Some(environment)) => environment,
        Ok(None) => {
            registry.borrow_mut().entries.remove(&file);
            return Err(NyxError::runtime(
                keyword,
                format!("Module '{}' failed to load.", name),
            ));
        }
        Err(e) => {
            registry.borrow_mut().entries.remove(&file);
            return Err(NyxError::runtime(
                keyword,
                format!("Could not read module '{}': {}.", name, e),
            ));
        }
    };

    let module = Rc::new(Module::new(name, file.clone(), environment));

    registry
        .borrow_mut()
        .entries
        .insert(file, ModuleState::Ready(Rc::clone(&module)));

    Ok(module)
}

/// Run `file` in a child interpreter and hand back its globals, or `None`
/// if it reported an error.
fn execute_file(parent: &Interpreter, file: &Path) -> std::io::Result<Option<EnvRef>> {
    let source = fs::read_to_string(file)?;
    let mut child = parent.child();

    let display = file.display().to_string();

    if crate::run_source(&mut child, display.as_str(), &source) {
        Ok(Some(child.globals()))
    } else {
        debug!("Module at {} did not complete", display);
        Ok(None)
    }
}
