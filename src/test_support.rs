//! Shared test doubles for command execution.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;

use crate::sync::{CommandOutput, CommandRunner, SyncError};

/// One recorded call made through a [`ScriptedRunner`].
#[derive(Clone, Debug)]
pub struct Invocation {
    /// Program name passed to the runner.
    pub program: String,
    /// Arguments rendered lossily to UTF-8.
    pub args: Vec<String>,
    /// Whether the call used the attached variant.
    pub attached: bool,
}

/// Command runner double that replays queued responses and records calls.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    captured: Rc<RefCell<VecDeque<CommandOutput>>>,
    attached: Rc<RefCell<VecDeque<Option<i32>>>>,
    invocations: Rc<RefCell<Vec<Invocation>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next captured `run` call.
    pub fn push_captured(&self, code: Option<i32>, stdout: &str) {
        self.captured.borrow_mut().push_back(CommandOutput {
            code,
            stdout: String::from(stdout),
            stderr: String::new(),
        });
    }

    /// Queues an exit code for the next `run_attached` call.
    pub fn push_attached(&self, code: Option<i32>) {
        self.attached.borrow_mut().push_back(code);
    }

    /// Returns every call made so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    fn record(&self, program: &str, args: &[OsString], attached: bool) {
        self.invocations.borrow_mut().push(Invocation {
            program: String::from(program),
            args: args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            attached,
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, SyncError> {
        self.record(program, args, false);
        self.captured
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| SyncError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response queued"),
            })
    }

    fn run_attached(&self, program: &str, args: &[OsString]) -> Result<Option<i32>, SyncError> {
        self.record(program, args, true);
        self.attached
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| SyncError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response queued"),
            })
    }
}
