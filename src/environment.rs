//! Scope frames.
//!
//! Every block, call and class body gets its own [`Environment`]; frames link
//! to their parent through a shared [`EnvRef`]. Closures hold an `EnvRef` too,
//! so a frame lives for as long as any closure or in-flight call still
//! reaches it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{NyxError, Result};
use crate::token::Token;
use crate::value::Value;

pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root frame with no parent.
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn with_enclosing(enclosing: EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }))
    }

    /// Introduce `name` in this frame. A name may be declared once per frame.
    pub fn declare(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            return Err(NyxError::runtime(
                name,
                format!("Variable '{}' is already declared.", name.lexeme),
            ));
        }

        self.values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    /// Bind a name that cannot collide, such as `this` or a native.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_owned(), value);
    }

    /// Lookup in this frame only.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Walk the chain outward.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(NyxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    /// Overwrite an existing binding, walking the chain outward.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(NyxError::runtime(
                name,
                format!("Variable '{}' is not declared.", name.lexeme),
            )),
        }
    }

    /// The frame exactly `distance` hops up from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let parent = current.borrow().enclosing.clone();
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        current
    }

    /// The outermost frame of `env`'s chain.
    pub fn root(env: &EnvRef) -> EnvRef {
        let mut current = Rc::clone(env);

        loop {
            let parent = current.borrow().enclosing.clone();
            match parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Read a resolved local. The resolver guarantees the frame holds `name`;
    /// a miss still surfaces as an ordinary undefined-variable error.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        debug!("get_at '{}' distance={}", name.lexeme, distance);

        Environment::ancestor(env, distance)
            .borrow()
            .lookup(&name.lexeme)
            .ok_or_else(|| {
                NyxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
            })
    }

    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        debug!("assign_at '{}' distance={}", name.lexeme, distance);

        let frame = Environment::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(NyxError::runtime(
                name,
                format!("Variable '{}' is not declared.", name.lexeme),
            )),
        }
    }

    /// Names bound in this frame, sorted. Used for introspection.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }
}
