//! Host functions installed into every global environment.
//!
//! The standard set is `time()`, `print(value)` and `input()`. Embedders and
//! tests can register more with [`Natives::define`].

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::environment::EnvRef;
use crate::interpreter::Interpreter;
use crate::value::{Callable, NativeFunction, Value};

/// Ordered registry of native functions.
#[derive(Clone, Default)]
pub struct Natives {
    entries: Vec<Rc<NativeFunction>>,
}

impl Natives {
    /// No natives at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `time`, `print` and `input`.
    pub fn standard() -> Self {
        let mut natives = Self::empty();

        natives
            .define("time", 0, |_, _| Ok(Value::Number(Utc::now().timestamp_millis() as f64)))
            .define("print", 1, |_, args| {
                let text = args[0].to_string();
                let mut out = io::stdout().lock();

                writeln!(out, "{}", text).map_err(|e| format!("print failed: {}", e))?;

                Ok(Value::string(text))
            })
            .define("input", 0, |_, _| {
                let mut line = String::new();
                let read = io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .map_err(|e| format!("input failed: {}", e))?;

                if read == 0 {
                    return Ok(Value::Nil);
                }

                let trimmed = line.trim_end_matches(['\n', '\r']);
                Ok(Value::string(trimmed))
            });

        natives
    }

    /// Register `name` with a fixed arity. A later entry with the same name
    /// replaces an earlier one when installed.
    pub fn define<F>(&mut self, name: &str, arity: usize, func: F) -> &mut Self
    where
        F: Fn(&mut Interpreter, &[Value]) -> Result<Value, String> + 'static,
    {
        debug!("Registering native '{}' (arity {})", name, arity);

        self.entries.push(Rc::new(NativeFunction {
            name: name.to_owned(),
            arity,
            func: Rc::new(func),
        }));

        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|n| n.name.as_str())
    }

    /// Bind every native into `env`.
    pub fn install(&self, env: &EnvRef) {
        info!("Installing {} native function(s)", self.entries.len());

        let mut frame = env.borrow_mut();
        for native in &self.entries {
            frame.define(
                &native.name,
                Value::Callable(Callable::Native(Rc::clone(native))),
            );
        }
    }
}
