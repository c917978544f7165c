//! The recipe execution engine.
//!
//! [`Runtime`] holds what every run shares: the handler registry, the
//! placeholder resolver and the OS facts. It is assembled once. Each recipe
//! run then gets its own [`Installer`], which owns the pending program and
//! the value stack and borrows everything else.
//!
//! ```ignore
//! let runtime = Runtime::from_config(&config)?;
//! let reporter = ConsoleReporter::new();
//! runtime.installer(&software, &reporter)?.execute()?;
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::config::InstallerConfig;
use crate::constants::SystemConstants;
use crate::core::error::{RecipeError, Result};
use crate::core::program::Program;
use crate::core::resolve::Resolver;
use crate::core::stack::{Frame, ValueStack};
use crate::core::step::Step;
use crate::handlers::HandlerRegistry;
use crate::platform::{LocalFacts, OsFacts};
use crate::report::Reporter;
use crate::software::SoftwareVersion;

/// Collaborators shared by every recipe run.
pub struct Runtime {
    registry: HandlerRegistry,
    resolver: Resolver,
    facts: Arc<dyn OsFacts>,
}

impl Runtime {
    pub fn new(registry: HandlerRegistry, resolver: Resolver, facts: Arc<dyn OsFacts>) -> Self {
        Self {
            registry,
            resolver,
            facts,
        }
    }

    /// Default handlers and system constants for this machine.
    pub fn from_config(config: &InstallerConfig) -> Result<Self> {
        let facts = LocalFacts::detect(config.machine_id, config.os_family, config.arch);
        Self::with_facts(config, Arc::new(facts))
    }

    /// Default handlers and system constants for the machine `facts`
    /// describes.
    pub fn with_facts(config: &InstallerConfig, facts: Arc<dyn OsFacts>) -> Result<Self> {
        let constants = SystemConstants::new(Arc::clone(&facts), config.url_builder());
        Ok(Self::new(
            HandlerRegistry::with_defaults(config),
            Resolver::new(Box::new(constants))?,
            facts,
        ))
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn facts(&self) -> &dyn OsFacts {
        self.facts.as_ref()
    }

    /// Prepare a run of `software`'s recipe.
    pub fn installer<'a>(
        &'a self,
        software: &'a SoftwareVersion,
        reporter: &'a dyn Reporter,
    ) -> Result<Installer<'a>> {
        Installer::new(self, software, reporter)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("os_family", &self.facts.os_family())
            .finish()
    }
}

/// One execution of one recipe.
pub struct Installer<'a> {
    runtime: &'a Runtime,
    software: &'a SoftwareVersion,
    reporter: &'a dyn Reporter,
    program: Program,
    stack: ValueStack,
}

impl<'a> Installer<'a> {
    /// Load the recipe and seed the stack with its resolved parameter.
    ///
    /// The seed is resolved against an empty stack, so only named constants
    /// may appear in it.
    pub fn new(
        runtime: &'a Runtime,
        software: &'a SoftwareVersion,
        reporter: &'a dyn Reporter,
    ) -> Result<Self> {
        let mut stack = ValueStack::new();
        let seed = runtime.resolver.resolve(&software.parameter, &stack)?;
        stack.push(Frame::new(seed));

        Ok(Self {
            runtime,
            software,
            reporter,
            program: Program::new(software.steps.iter().cloned()),
            stack,
        })
    }

    /// Run every pending step, then drain the stack.
    ///
    /// Stops at the first error. Frames still on the stack at that point
    /// are left as they are.
    pub fn execute(&mut self) -> Result<()> {
        debug!(software = self.software.label(), steps = self.program.len(), "start installing");
        while let Some(step) = self.program.next_step() {
            self.execute_step(&step)?;
        }
        debug!(software = self.software.label(), "finished installing");
        self.clean_up_stack()
    }

    /// Execute a single step against the current stack.
    pub fn execute_step(&mut self, step: &Step) -> Result<()> {
        debug!(%step, "executing step");
        if step.operation.is_pop() {
            return self.stack.pop_and_clean();
        }

        let runtime = self.runtime;
        let handler = runtime
            .registry
            .get(step.operation)
            .ok_or(RecipeError::NoHandler(step.operation))?;
        let resolved = runtime.resolver.resolve(&step.parameter, &self.stack)?;
        let frame = handler
            .handle(&resolved, self)
            .map_err(|e| RecipeError::from_handler(step.operation, e))?;

        self.reporter.report(step, &frame);
        self.stack.push(frame);
        Ok(())
    }

    /// Pop every remaining frame, running cleanups. Stops at the first
    /// cleanup that fails.
    pub fn clean_up_stack(&mut self) -> Result<()> {
        self.stack.drain_all()
    }

    /// Run `steps` right away, in the current scope, before returning.
    ///
    /// The steps bypass the pending program. A balanced sequence leaves
    /// the stack as it found it.
    pub fn insert(&mut self, steps: Vec<Step>) -> Result<()> {
        debug!(count = steps.len(), "inserting steps into the running recipe");
        for step in &steps {
            self.execute_step(step)?;
        }
        Ok(())
    }

    /// Substitute placeholders against the current stack.
    pub fn resolve(&self, parameter: &str) -> Result<String> {
        self.runtime.resolver.resolve(parameter, &self.stack)
    }

    /// Value of the top frame, normally the result of the parent step.
    pub fn additional_parameter(&self) -> Result<String> {
        Ok(self.stack.peek_at(0)?.value().to_string())
    }

    /// Values of the `count` topmost frames; index 0 is the top.
    pub fn additional_parameters(&self, count: usize) -> Result<Vec<String>> {
        self.stack.top_values(count)
    }

    /// A copy of the current stack.
    pub fn stack(&self) -> ValueStack {
        self.stack.clone()
    }

    /// Remove and return the steps nested under the step being handled.
    pub fn children(&mut self) -> Vec<Step> {
        let children = self.program.extract_children();
        debug!(count = children.len(), "extracted children");
        children
    }

    /// Steps not yet executed.
    pub fn pending(&self) -> &Program {
        &self.program
    }

    pub fn facts(&self) -> &'a dyn OsFacts {
        self.runtime.facts.as_ref()
    }

    pub fn reporter(&self) -> &'a dyn Reporter {
        self.reporter
    }

    pub fn software(&self) -> &'a SoftwareVersion {
        self.software
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }
}
