//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use recipe_installer::{
    Arch, Constant, ConstantSource, Frame, HandlerRegistry, InstallerConfig, MemoryReporter,
    Operation, OsFamily, RecipeError, Resolver, Runtime, SoftwareVersion, StaticFacts, Step,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Machine id of [`ubuntu`], also the value of `{{UUID}}`.
pub const MACHINE_ID: Uuid = Uuid::from_u128(1);

/// Constants with fixed, recognizable values.
pub struct FixedConstants;

impl ConstantSource for FixedConstants {
    fn supported(&self) -> &[Constant] {
        &Constant::ALL
    }

    fn resolve(&self, constant: Constant) -> recipe_installer::Result<String> {
        match constant {
            Constant::Desktop => Ok("/home/tester/Desktop/".into()),
            Constant::Delimiter => Ok("/".into()),
            Constant::SwMirror => Ok("http://mirror.test/media".into()),
            Constant::Uuid => Ok("00000000-0000-0000-0000-000000000001".into()),
            Constant::ProgramFilesX86 => Err(RecipeError::InvalidRecipe(
                "PROGRAM_FILES_X86 is only defined on WIN".into(),
            )),
        }
    }
}

pub fn ubuntu() -> Arc<StaticFacts> {
    Arc::new(
        StaticFacts::new(OsFamily::Ubuntu, Arch::X86_64)
            .version("22.04")
            .id(MACHINE_ID),
    )
}

/// Runtime with only the handlers registered by `setup`.
pub fn runtime_with(setup: impl FnOnce(&mut HandlerRegistry)) -> Runtime {
    let mut registry = HandlerRegistry::new();
    setup(&mut registry);
    Runtime::new(
        registry,
        Resolver::new(Box::new(FixedConstants)).unwrap(),
        ubuntu(),
    )
}

/// Runtime with the built-in handlers, downloading from `mirror`.
pub fn default_runtime(mirror: &str) -> Runtime {
    runtime_for_hosts(mirror, "http://127.0.0.1:9")
}

/// Runtime with the built-in handlers, downloading from `mirror` and
/// uploading to `vmhost`.
pub fn runtime_for_hosts(mirror: &str, vmhost: &str) -> Runtime {
    let config = InstallerConfig {
        software_mirror: mirror.to_string(),
        local_vmhost: vmhost.to_string(),
        download_attempts: 1,
        ..InstallerConfig::default()
    };
    Runtime::with_facts(&config, ubuntu()).unwrap()
}

pub fn software(parameter: &str, steps: Vec<Step>) -> SoftwareVersion {
    SoftwareVersion::new(steps, parameter)
}

pub fn run(
    runtime: &Runtime,
    software: &SoftwareVersion,
) -> (recipe_installer::Result<()>, MemoryReporter) {
    let reporter = MemoryReporter::new();
    let result = runtime
        .installer(software, &reporter)
        .and_then(|mut installer| installer.execute());
    (result, reporter)
}

/// Values of every reported frame, in report order.
pub fn reported_values(reporter: &MemoryReporter) -> Vec<String> {
    reporter
        .reports()
        .into_iter()
        .map(|r| r.result.value().to_string())
        .collect()
}

/// Operations of every report, in report order.
pub fn reported_ops(reporter: &MemoryReporter) -> Vec<Operation> {
    reporter
        .reports()
        .into_iter()
        .map(|r| r.step.operation)
        .collect()
}

/// Register a handler on `operation` that records its parameter and
/// answers with "1" if a file by that name exists, "0" otherwise.
pub fn register_exists_check(
    registry: &mut HandlerRegistry,
    operation: Operation,
) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    registry.register_fn(operation, move |parameter, _| {
        sink.lock().unwrap().push(parameter.to_string());
        let exists = Path::new(parameter).exists();
        Ok(Frame::new(if exists { "1" } else { "0" }))
    });
    seen
}
