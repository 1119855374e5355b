use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one frame of the environment chain.  A frame lives as
/// long as its longest holder: the active call, a child frame, or a closure.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this frame, shadowing or overwriting silently.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Value bound in this frame only.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Look `name` up, walking outward through the chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite an existing binding, walking outward through the chain.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` links up from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut frame: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = frame.borrow().enclosing.clone()?;
            frame = next;
        }

        Some(frame)
    }

    /// Read `name` from the frame `distance` links up, without searching.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        debug!("get_at: '{}' at distance {}", name.lexeme, distance);

        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let value: Option<Value> = frame.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Write `name` in the frame `distance` links up, without searching.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        debug!("assign_at: '{}' at distance {}", name.lexeme, distance);

        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        frame.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name.line, format!("Undefined variable '{}'.", name.lexeme))
}
