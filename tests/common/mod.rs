#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::thread;

use rox::interpreter::Interpreter;
use rox::lox::{Lox, RunStatus};

/// In‑memory writer the test keeps a handle to after the interpreter takes
/// ownership of its clone.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("utf-8 output")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Outcome {
    pub status: RunStatus,
    pub stdout: String,
    pub errors: Vec<String>,
}

impl Outcome {
    pub fn lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

/// A driver whose printed output lands in the returned buffer.
pub fn capturing_lox() -> (Lox, SharedBuf) {
    let buf = SharedBuf::default();
    let lox = Lox::with_interpreter(Interpreter::with_output(Box::new(buf.clone())));
    (lox, buf)
}

/// Stack matching the binary's interpreter thread, so recursion hits the
/// call depth limit before the host stack.
const STACK_SIZE: usize = 128 * 1024 * 1024;

pub fn on_large_stack<R, F>(job: F) -> R
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(job)
        .expect("spawn test thread")
        .join()
        .expect("test thread panicked")
}

pub fn run(source: &str) -> Outcome {
    let source: String = source.to_owned();

    on_large_stack(move || {
        let (mut lox, buf) = capturing_lox();
        let status = lox.run(&source);
        let errors = lox
            .take_diagnostics()
            .iter()
            .map(|d| d.to_string())
            .collect();

        Outcome {
            status,
            stdout: buf.contents(),
            errors,
        }
    })
}
