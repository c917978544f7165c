//! The pending step sequence of one recipe execution.

use std::collections::VecDeque;

use super::step::Step;

/// Steps that still have to run, front first.
///
/// Consumed from the front by the installer. Handlers may take a whole
/// subtree out of it with [`Program::extract_children`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    steps: VecDeque<Step>,
}

impl Program {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Remove and return the next step.
    pub fn next_step(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    pub fn peek(&self) -> Option<&Step> {
        self.steps.front()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Take every step nested under the step that just executed.
    ///
    /// Stops in front of the POP that closes the caller's own level and
    /// leaves it in place. If the sequence runs out first, everything that
    /// was left is returned.
    pub fn extract_children(&mut self) -> Vec<Step> {
        let mut children = Vec::new();
        let mut level = 0usize;

        while let Some(front) = self.steps.front() {
            let closes = front.operation.is_pop();
            if closes && level == 0 {
                break;
            }
            let Some(step) = self.steps.pop_front() else {
                break;
            };
            if closes {
                level -= 1;
            } else {
                level += 1;
            }
            children.push(step);
        }

        children
    }

    /// Rebuild the step tree by repeated child extraction.
    ///
    /// POPs that close nothing are dropped.
    pub fn into_tree(mut self) -> Vec<StepNode> {
        let mut nodes = Vec::new();
        while let Some(step) = self.next_step() {
            if step.operation.is_pop() {
                continue;
            }
            let children = Program::new(self.extract_children()).into_tree();
            if self.peek().is_some_and(|s| s.operation.is_pop()) {
                self.next_step();
            }
            nodes.push(StepNode { step, children });
        }
        nodes
    }
}

impl From<Vec<Step>> for Program {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

/// A step together with the steps nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNode {
    pub step: Step,
    pub children: Vec<StepNode>,
}
