//! Runtime values and the object model: callables, classes and instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{NyxError, Result};
use crate::interpreter::Interpreter;
use crate::module::Module;
use crate::token::{format_number, Token};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Callable(Callable),
    Instance(Rc<RefCell<Instance>>),
    Module(Rc<Module>),
}

impl Value {
    /// Tag used in type error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Callable(_) => "callable",
            Value::Instance(_) => "instance",
            Value::Module(_) => "module",
        }
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }
}

impl PartialEq for Value {
    /// Scalars compare by value; callables, instances and modules by
    /// identity. `nil` only equals `nil`.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.same(b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Callable(c) => write!(f, "{}", c),
            Value::Instance(i) => write!(f, "<{} instance>", i.borrow().class.name),
            Value::Module(m) => write!(f, "<module {}>", m.name()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callables
// ─────────────────────────────────────────────────────────────────────────────

/// Host-side body of a native function. Errors are plain messages; the
/// interpreter attaches the call-site location.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>>;

pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Anything that can appear left of `(`.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already-evaluated arguments. Arity is checked by the
    /// interpreter at the call site before this runs.
    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>, paren: &Token) -> Result<Value> {
        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(interpreter, &args).map_err(|msg| NyxError::runtime(paren, msg))
            }
            Callable::Function(function) => function.call(interpreter, args),
            Callable::Class(class) => Class::instantiate(class, interpreter, args),
        }
    }

    fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Function(function) => match &function.declaration.name {
                Some(name) => write!(f, "<fn {}>", name.lexeme),
                None => write!(f, "<fn>"),
            },
            Callable::Class(class) => write!(f, "<class {}>", class.name),
        }
    }
}

/// A user function: its declaration plus the frame it closed over.
#[derive(Debug)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.arity()
    }

    /// A copy of this method whose closure additionally binds `this`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(Rc::clone(&self.declaration), environment)
    }

    /// Run the body in a fresh child of the closure. Falling off the end
    /// yields `nil`.
    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
        Ok(self.invoke(interpreter, args)?.unwrap_or(Value::Nil))
    }

    /// Like [`call`](Self::call) but keeps "no return" apart from an explicit
    /// `return nil;`.
    pub fn invoke(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Option<Value>> {
        debug!("Calling user function '{}'", self.declaration.display_name());

        let environment = Environment::with_enclosing(Rc::clone(&self.closure));

        {
            let mut frame = environment.borrow_mut();
            for (param, arg) in self.declaration.params.iter().zip(args) {
                frame.declare(param, arg)?;
            }
        }

        interpreter.execute_block(&self.declaration.body, environment)?;

        Ok(interpreter.take_return())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes and instances
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
        }
    }

    /// Most-derived first.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|parent| parent.find_method(name)),
        }
    }

    pub fn initializer(&self) -> Option<Rc<Function>> {
        self.find_method("init")
    }

    pub fn arity(&self) -> usize {
        self.initializer().map_or(0, |init| init.arity())
    }

    /// Allocate an instance and run `init` on it, if any.
    pub fn instantiate(
        class: &Rc<Class>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));

        if let Some(init) = class.initializer() {
            let returned = init.bind(Rc::clone(&instance)).invoke(interpreter, args)?;

            if let Some(value) = returned {
                if value != Value::Nil {
                    let at = init
                        .declaration
                        .name
                        .as_ref()
                        .unwrap_or(&init.declaration.keyword);

                    return Err(NyxError::runtime(
                        at,
                        "Did not expect non-nil return inside init.",
                    ));
                }
            }
        }

        Ok(Value::Instance(instance))
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Field first, then a bound method from the class chain.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.find_method(&name.lexeme);

        match method {
            Some(method) => Ok(Value::Callable(Callable::Function(Rc::new(
                method.bind(Rc::clone(instance)),
            )))),
            None => Err(NyxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
