//! Per-step reporting.
//!
//! Every executed operation step (never a POP) is reported exactly once,
//! after its frame has been produced and before it is pushed.

use serde::Serialize;
use std::cell::RefCell;

use crate::core::output;
use crate::core::stack::Frame;
use crate::core::step::Step;

/// Receives one notification per executed operation step.
pub trait Reporter {
    fn report(&self, step: &Step, result: &Frame);
}

/// Prints one colored line per step, optionally tagged with a run id.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    tag: Option<String>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, step: &Step, result: &Frame) {
        output::step(
            self.tag.as_deref(),
            step.operation.as_str(),
            &result.to_string(),
        );
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub result: Frame,
}

/// Collects reports in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: RefCell<Vec<StepReport>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<StepReport> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn into_reports(self) -> Vec<StepReport> {
        self.reports.into_inner()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, step: &Step, result: &Frame) {
        self.reports.borrow_mut().push(StepReport {
            step: step.clone(),
            result: result.clone(),
        });
    }
}
