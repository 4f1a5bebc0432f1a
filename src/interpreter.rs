//! Tree-walking evaluator.
//!
//! The interpreter holds one "current environment" pointer plus the
//! resolution map filled in by the [`Resolver`](crate::resolver::Resolver).
//! Statements produce no value; expressions produce a [`Value`].
//!
//! `return` does not unwind through `Err`. It parks its value in
//! `self.returning` and every enclosing block stops after the statement that
//! set it; the call that owns the body takes the value back out. `None`
//! means "no return executed", `Some(Value::Nil)` an explicit `return nil;`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{AssignOp, Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::{Diagnostics, NyxError, Result};
use crate::module::{self, ModuleRegistry, SearchPaths};
use crate::natives::Natives;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Class, Function, Instance, Value};

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Hop distance per resolved node. Shared with module interpreters so a
    /// function defined in a module still finds its bindings when called
    /// from the importer.
    locals: Rc<RefCell<HashMap<ExprId, usize>>>,
    returning: Option<Value>,
    natives: Natives,
    modules: Rc<RefCell<ModuleRegistry>>,
    diagnostics: Rc<Diagnostics>,
}

impl Interpreter {
    /// Standard natives and the default module search roots.
    pub fn new(diagnostics: Rc<Diagnostics>) -> Self {
        Self::with_parts(
            diagnostics,
            Natives::standard(),
            ModuleRegistry::shared(SearchPaths::default()),
        )
    }

    pub fn with_parts(
        diagnostics: Rc<Diagnostics>,
        natives: Natives,
        modules: Rc<RefCell<ModuleRegistry>>,
    ) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new();
        natives.install(&globals);

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Rc::new(RefCell::new(HashMap::new())),
            returning: None,
            natives,
            modules,
            diagnostics,
        }
    }

    /// A fresh interpreter for loading a module: its own globals, everything
    /// else shared with `self`.
    pub fn child(&self) -> Self {
        let mut child = Self::with_parts(
            Rc::clone(&self.diagnostics),
            self.natives.clone(),
            Rc::clone(&self.modules),
        );
        child.locals = Rc::clone(&self.locals);
        child
    }

    /// The root environment.
    pub fn globals(&self) -> EnvRef {
        Rc::clone(&self.globals)
    }

    pub fn modules(&self) -> Rc<RefCell<ModuleRegistry>> {
        Rc::clone(&self.modules)
    }

    pub fn diagnostics(&self) -> Rc<Diagnostics> {
        Rc::clone(&self.diagnostics)
    }

    /// Record the hop distance of a resolved node.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.borrow_mut().insert(id, depth);
    }

    /// Consume the pending return value, if any.
    pub fn take_return(&mut self) -> Option<Value> {
        self.returning.take()
    }

    /// Execute a whole program. A runtime error is reported to the
    /// diagnostic sink and stops the remaining statements; the return value
    /// says whether the program ran to completion.
    pub fn interpret(&mut self, statements: &[Stmt]) -> bool {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                debug!("Runtime error: {}", e);

                self.diagnostics.error(&e);
                self.environment = Rc::clone(&self.globals);
                self.returning = None;

                return false;
            }
        }

        info!("Interpretation completed successfully");
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Let { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Declaring '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().declare(name, value)?;
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, environment)?;
            }

            Stmt::Function(declaration) => {
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));

                if let Some(name) = &declaration.name {
                    debug!("Defining function '{}'", name.lexeme);
                    self.environment.borrow_mut().declare(
                        name,
                        Value::Callable(Callable::Function(Rc::new(function))),
                    )?;
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods)?,

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition)? {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }

            Stmt::While { condition, body } => {
                while self.condition(condition)? {
                    self.execute(body)?;

                    if self.returning.is_some() {
                        break;
                    }
                }
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                self.returning = Some(value);
            }

            Stmt::Import { keyword, path } => {
                let module = module::load(self, keyword, path)?;

                if let Some(binding) = path.last() {
                    let mut frame = self.environment.borrow_mut();

                    match frame.lookup(&binding.lexeme) {
                        Some(Value::Module(existing)) if Rc::ptr_eq(&existing, &module) => {}
                        _ => frame.declare(binding, Value::Module(module))?,
                    }
                }
            }
        }

        Ok(())
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<()> {
        let previous = mem::replace(&mut self.environment, environment);

        let result = self.run_statements(statements);

        self.environment = previous;
        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.execute(stmt)?;

            if self.returning.is_some() {
                break;
            }
        }

        Ok(())
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        self.environment.borrow_mut().declare(name, Value::Nil)?;

        let parent: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => {
                    let at = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(NyxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        let previous = Rc::clone(&self.environment);

        if let Some(parent) = &parent {
            let environment = Environment::with_enclosing(Rc::clone(&previous));
            environment
                .borrow_mut()
                .define("super", Value::Callable(Callable::Class(Rc::clone(parent))));
            self.environment = environment;
        }

        let table = methods
            .iter()
            .filter_map(|decl| {
                let method_name = decl.name.as_ref()?.lexeme.clone();
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment));
                Some((method_name, Rc::new(function)))
            })
            .collect();

        let class = Class::new(name.lexeme.clone(), parent, table);

        previous
            .borrow_mut()
            .define(&name.lexeme, Value::Callable(Callable::Class(Rc::new(class))));

        self.environment = previous;

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    /// Only `true` takes the branch.
    fn condition(&mut self, expr: &Expr) -> Result<bool> {
        Ok(matches!(self.evaluate(expr)?, Value::Bool(true)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::string(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => self.lookup_variable(*id, name),

            Expr::Assign {
                id,
                name,
                operator,
                op,
                value,
            } => self.evaluate_assign(*id, name, operator, *op, value),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                Value::Module(module) => module.get(name),
                other => Err(NyxError::runtime(
                    name,
                    format!(
                        "Only instances and modules have properties, got {}.",
                        other.type_name()
                    ),
                )),
            },

            Expr::Set {
                object,
                name,
                operator,
                op,
                value,
            } => self.evaluate_set(object, name, operator, *op, value),

            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Function(declaration) => Ok(Value::Callable(Callable::Function(Rc::new(
                Function::new(Rc::clone(declaration), Rc::clone(&self.environment)),
            )))),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.evaluate(right)?;

        match (&operator.token_type, right) {
            (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
            (TokenType::MINUS, _) => Err(NyxError::runtime(operator, "Operand must be a number.")),
            (TokenType::BANG, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (TokenType::BANG, _) => Err(NyxError::runtime(operator, "Operand must be a boolean.")),
            _ => Err(NyxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        debug!("Binary {} on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
            TokenType::PLUS => {
                return match (left, right) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    (Value::String(a), right) => Ok(Value::string(format!("{}{}", a, right))),
                    _ => Err(NyxError::runtime(
                        operator,
                        "Operands must be two numbers or a string followed by any value.",
                    )),
                };
            }
            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (left, right) else {
            return Err(NyxError::runtime(operator, "Operands must be numbers."));
        };

        let value = match operator.token_type {
            TokenType::MINUS => Value::Number(a - b),
            TokenType::STAR => Value::Number(a * b),
            TokenType::SLASH => Value::Number(a / b),
            TokenType::GREATER => Value::Bool(a > b),
            TokenType::GREATER_EQUAL => Value::Bool(a >= b),
            TokenType::LESS => Value::Bool(a < b),
            TokenType::LESS_EQUAL => Value::Bool(a <= b),
            _ => return Err(NyxError::runtime(operator, "Invalid binary operator.")),
        };

        Ok(value)
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let Value::Bool(left) = self.evaluate(left)? else {
            return Err(NyxError::runtime(operator, "Operand must be a boolean."));
        };

        let decided = match operator.token_type {
            TokenType::OR => left,
            _ => !left,
        };

        if decided {
            return Ok(Value::Bool(left));
        }

        match self.evaluate(right)? {
            Value::Bool(right) => Ok(Value::Bool(right)),
            _ => Err(NyxError::runtime(operator, "Operand must be a boolean.")),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg)?);
        }

        let Value::Callable(callable) = callee else {
            return Err(NyxError::runtime(paren, "Can only call functions and classes."));
        };

        if args.len() != callable.arity() {
            return Err(NyxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    args.len()
                ),
            ));
        }

        debug!("Calling {} with {} argument(s)", callable, args.len());
        callable.call(self, args, paren)
    }

    fn evaluate_assign(
        &mut self,
        id: ExprId,
        name: &Token,
        operator: &Token,
        op: AssignOp,
        value: &Expr,
    ) -> Result<Value> {
        let rhs = self.evaluate(value)?;
        let distance = self.distance(id);

        let result = if op.is_compound() {
            let current = match distance {
                Some(distance) => Environment::get_at(&self.environment, distance, name)?,
                None => Environment::root(&self.environment).borrow().get(name)?,
            };
            numeric(operator, op, current, rhs)?
        } else {
            rhs
        };

        match distance {
            Some(distance) => {
                Environment::assign_at(&self.environment, distance, name, result.clone())?
            }
            None => Environment::root(&self.environment)
                .borrow_mut()
                .assign(name, result.clone())?,
        }

        Ok(result)
    }

    fn evaluate_set(
        &mut self,
        object: &Expr,
        name: &Token,
        operator: &Token,
        op: AssignOp,
        value: &Expr,
    ) -> Result<Value> {
        let instance = match self.evaluate(object)? {
            Value::Instance(instance) => instance,
            Value::Module(module) => {
                let value = self.evaluate(value)?;
                module.set(name, value.clone())?;
                return Ok(value);
            }
            other => {
                return Err(NyxError::runtime(
                    name,
                    format!("Only instances have fields, got {}.", other.type_name()),
                ))
            }
        };

        let rhs = self.evaluate(value)?;

        let result = if op.is_compound() {
            let current = Instance::get(&instance, name)?;
            numeric(operator, op, current, rhs)?
        } else {
            rhs
        };

        instance.borrow_mut().set(name, result.clone());
        Ok(result)
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let Some(distance) = self.distance(id) else {
            return Err(NyxError::runtime(
                keyword,
                "Can't use 'super' outside of a subclass.",
            ));
        };

        let superclass = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Callable(Callable::Class(class)) => class,
            _ => return Err(NyxError::runtime(keyword, "Superclass must be a class.")),
        };

        let this = Token::synthetic("this", keyword);
        let instance = match Environment::get_at(&self.environment, distance.saturating_sub(1), &this)? {
            Value::Instance(instance) => instance,
            _ => return Err(NyxError::runtime(keyword, "'this' is not an instance.")),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                found.bind(instance),
            )))),
            None => Err(NyxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn distance(&self, id: ExprId) -> Option<usize> {
        self.locals.borrow().get(&id).copied()
    }

    /// Resolved names go straight to their frame; everything else is a
    /// global of the current chain's root.
    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.distance(id) {
            Some(distance) => Environment::get_at(&self.environment, distance, name),
            None => Environment::root(&self.environment).borrow().get(name),
        }
    }
}

/// Read-modify-write arithmetic for compound assignment.
fn numeric(operator: &Token, op: AssignOp, current: Value, rhs: Value) -> Result<Value> {
    match (current, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op.apply(a, b))),
        _ => Err(NyxError::runtime(operator, "Operands must be numbers.")),
    }
}
