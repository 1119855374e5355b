//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Flow`]: `Normal`, or `Return(value)` travelling
//! up to the nearest call frame.  Runtime errors travel separately as
//! `Err(LoxError::Runtime)` and abort the whole `interpret` call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::resolver::Locals;
use crate::token::{LiteralValue, Token, TokenType};
use crate::value::{Callable, NativeFunction, Value};

/// Deepest chain of nested calls before a script is stopped with a runtime
/// error.  The host stack must hold this many Lox frames; the binary runs
/// the interpreter on a thread sized for it.
pub const MAX_CALL_DEPTH: usize = 512;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    out: Box<dyn Write>,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to stdout, with `clock` defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction::clock()))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            depth: 0,
        }
    }

    /// Merge a resolution table produced by the resolver.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Adding {} resolved local(s)", locals.len());

        self.locals.extend(locals);
    }

    /// Runs a program.  The first runtime error stops execution of the
    /// remaining statements and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class(class) => {
                self.execute_class(class)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the current
    /// environment afterwards on every path (normal, return, or error).
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let result: Result<Flow> = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_class(&mut self, class: &ClassDecl) -> Result<()> {
        debug!("Defining class '{}'", class.name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match &class.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(superclass)) => Some(superclass),
                _ => return Err(LoxError::runtime(expr.line(), "Superclass must be a class.")),
            },
            None => None,
        };

        // Placeholder so methods can refer to the class by name.
        self.environment
            .borrow_mut()
            .define(&class.name.lexeme, Value::Nil);

        let method_env: EnvRef = match &superclass {
            Some(superclass) => {
                let env: EnvRef = Environment::child_of(&self.environment);
                env.borrow_mut().define(
                    "super",
                    Value::Callable(Callable::Class(Rc::clone(superclass))),
                );
                env
            }
            None => Rc::clone(&self.environment),
        };

        let methods: HashMap<String, Rc<LoxFunction>> = class
            .methods
            .iter()
            .map(|decl| {
                let is_initializer = decl.name.lexeme == "init";
                let method = LoxFunction::new(Rc::clone(decl), Rc::clone(&method_env), is_initializer);
                (decl.name.lexeme.clone(), Rc::new(method))
            })
            .collect();

        let lox_class = LoxClass::new(class.name.lexeme.clone(), superclass, methods);

        self.environment.borrow_mut().assign(
            &class.name,
            Value::Callable(Callable::Class(Rc::new(lox_class))),
        )?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

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
            } => {
                let left_val: Value = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.call_value(callee_val, arg_values, paren)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name.line, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!(
            "Binary {}: left={}, right={}",
            operator.lexeme, left_val, right_val
        );

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),
            _ => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.")),
                }
            }
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = self.locals.get(&id).copied().ok_or_else(|| {
            LoxError::runtime(keyword.line, "Can't use 'super' outside of a subclass.")
        })?;

        let superclass = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Callable(Callable::Class(class)) => class,
            _ => return Err(LoxError::runtime(keyword.line, "Superclass must be a class.")),
        };

        // `this` lives in the scope just inside the one holding `super`.
        let this_token = Token::new(TokenType::THIS, "this", None, keyword.line);
        let object = match Environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)? {
            Value::Instance(instance) => instance,
            _ => return Err(LoxError::runtime(keyword.line, "Invalid 'this' binding.")),
        };

        let Some(found) = superclass.find_method(&method.lexeme) else {
            return Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            ));
        };

        Ok(Value::Callable(Callable::Function(Rc::new(found.bind(object)))))
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, paren: &Token) -> Result<Value> {
        let Value::Callable(callable) = callee else {
            return Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren.line,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren.line, "Stack overflow."));
        }

        debug!("Calling {} with {} argument(s)", callable, arguments.len());

        self.depth += 1;
        let result: Result<Value> = callable.call(self, arguments, paren.line);
        self.depth -= 1;

        result
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
    }
}
