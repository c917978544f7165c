//! Execution engine behavior: stack discipline, placeholders, cleanup,
//! error propagation and re-entrant handlers.

mod common;

use common::*;
use recipe_installer::handlers::basic;
use recipe_installer::handlers::files;
use recipe_installer::{Cleanup, ErrorKind, Frame, Operation, Step, StepsBuilder};
use std::path::Path;

// =============================================================================
// Stack and placeholders
// =============================================================================

#[test]
fn test_set_chain_reports_each_step() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
    });
    let sw = software(
        "seed",
        vec![
            Step::new(Operation::Set, "a"),
            Step::new(Operation::Set, "{{0}}-b-{{1}}"),
            Step::pop(),
            Step::pop(),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    assert_eq!(reported_values(&reporter), vec!["a", "a-b-seed"]);
    assert_eq!(reported_ops(&reporter), vec![Operation::Set, Operation::Set]);
}

#[test]
fn test_named_constants_in_parameters() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
    });
    let sw = software(
        "{{SW_MIRROR}}/app.zip",
        vec![
            Step::new(Operation::Set, "{{DESKTOP}}setup{{DELIMITER}}{{0}}"),
            Step::pop(),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    assert_eq!(
        reported_values(&reporter),
        vec!["/home/tester/Desktop/setup/http://mirror.test/media/app.zip"]
    );
}

#[test]
fn test_unknown_tokens_stay_literal() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
    });
    let sw = software("x", vec![Step::new(Operation::Set, "{{HOME}} {{ 0 }} {0}")]);

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    assert_eq!(reported_values(&reporter), vec!["{{HOME}} {{ 0 }} {0}"]);
}

#[test]
fn test_index_beyond_stack_is_invalid_recipe() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
    });
    let sw = software("seed", vec![Step::new(Operation::Set, "{{3}}")]);

    let (result, reporter) = run(&rt, &sw);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRecipe);
    assert!(reporter.is_empty());
}

#[test]
fn test_seed_cannot_reference_stack() {
    let rt = runtime_with(|_| {});
    let sw = software("{{0}}", vec![]);

    let (result, _) = run(&rt, &sw);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidRecipe);
}

#[test]
fn test_constant_undefined_on_this_os_fails() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
    });
    let sw = software("", vec![Step::new(Operation::Set, "{{PROGRAM_FILES_X86}}")]);

    let (result, _) = run(&rt, &sw);
    assert!(result.is_err());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_pop_on_empty_stack_underflows() {
    let rt = runtime_with(|_| {});
    let sw = software("seed", vec![Step::pop(), Step::pop()]);

    let (result, _) = run(&rt, &sw);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::StackUnderflow);
}

#[test]
fn test_unregistered_operation_is_configuration_error() {
    let rt = default_runtime("http://127.0.0.1:9/media");
    let sw = software("", vec![Step::new(Operation::ApkInstall, "{{7}}")]);

    let (result, reporter) = run(&rt, &sw);
    let err = result.unwrap_err();
    // Lookup happens first, so the bad index never gets a chance to fail.
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("APK_INSTALL"));
    assert!(reporter.is_empty());
}

#[test]
fn test_handler_failure_stops_run_without_cleanup() {
    let rt = runtime_with(|r| {
        r.register(Operation::ToFile, files::to_file)
            .register(Operation::Set, basic::set)
            .register(Operation::Equals, basic::equals);
    });
    let sw = software(
        "",
        vec![
            Step::new(Operation::ToFile, "payload"),
            Step::new(Operation::Set, "actual"),
            Step::new(Operation::Equals, "expected"),
            Step::pop(),
            Step::new(Operation::Set, "never"),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Handler);
    assert!(err.to_string().contains("EQUALS failed"));
    assert_eq!(reported_ops(&reporter), vec![Operation::ToFile, Operation::Set]);

    // The temporary file's frame was never popped.
    let tmp = &reported_values(&reporter)[0];
    assert!(Path::new(tmp).exists());
    std::fs::remove_file(tmp).unwrap();
}

#[test]
fn test_equals_checks_parent_result() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set)
            .register(Operation::Equals, basic::equals);
    });
    let sw = software(
        "",
        vec![
            Step::new(Operation::Set, "4.2"),
            Step::new(Operation::Equals, "4.2"),
            Step::pop(),
            Step::pop(),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    assert_eq!(reported_values(&reporter), vec!["4.2", "1"]);
}

// =============================================================================
// Cleanup
// =============================================================================

#[test]
fn test_failing_cleanup_on_pop_aborts_run() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set).register_fn(Operation::Dmg, |_, _| {
            Ok(Frame::new("mounted").with_cleanup(Cleanup::unmount("/nonexistent/techmount-pop")))
        });
    });
    let sw = software(
        "seed",
        vec![
            Step::new(Operation::Dmg, "image.dmg"),
            Step::pop(),
            Step::new(Operation::Set, "after"),
            Step::pop(),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cleanup);
    assert!(err.to_string().contains("/nonexistent/techmount-pop"));
    assert_eq!(reported_values(&reporter), vec!["mounted"]);
}

#[test]
fn test_pop_runs_cleanup_of_its_frame_only() {
    let mut seen = None;
    let rt = runtime_with(|r| {
        r.register(Operation::ToFile, files::to_file)
            .register(Operation::Set, basic::set);
        seen = Some(register_exists_check(r, Operation::Wait));
    });
    let sw = software(
        "",
        vec![
            Step::new(Operation::ToFile, "one"),
            Step::new(Operation::ToFile, "two"),
            Step::pop(),
            Step::new(Operation::Wait, "{{0}}"),
            Step::pop(),
            Step::pop(),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();

    let values = reported_values(&reporter);
    assert_eq!(values[2], "1", "outer file must survive the inner POP");
    assert_eq!(seen.unwrap().lock().unwrap().as_slice(), &values[..1]);
    assert!(!Path::new(&values[0]).exists());
    assert!(!Path::new(&values[1]).exists());
}

#[test]
fn test_unclosed_frames_are_cleaned_at_the_end() {
    let rt = runtime_with(|r| {
        r.register(Operation::ToFile, files::to_file);
    });
    let sw = software(
        "",
        vec![
            Step::new(Operation::ToFile, "a"),
            Step::new(Operation::ToFile, "b"),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    for path in reported_values(&reporter) {
        assert!(!Path::new(&path).exists());
    }
}

// =============================================================================
// Re-entrant handlers
// =============================================================================

#[test]
fn test_inserted_steps_run_immediately_and_are_reported() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
        r.register_fn(Operation::AfterInstall, |parameter, installer| {
            let before = installer.stack().len();
            installer.insert(
                StepsBuilder::new()
                    .add(Operation::Set, format!("inner {{{{0}}}} {}", parameter))
                    .build(),
            )?;
            assert_eq!(installer.stack().len(), before);
            Ok(Frame::new("outer"))
        });
    });
    let sw = software(
        "seed",
        vec![Step::new(Operation::AfterInstall, "p"), Step::pop()],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    assert_eq!(
        reported_ops(&reporter),
        vec![Operation::Set, Operation::AfterInstall]
    );
    assert_eq!(reported_values(&reporter), vec!["inner seed p", "outer"]);
}

#[test]
fn test_inserted_failure_keeps_its_kind() {
    let rt = runtime_with(|r| {
        r.register_fn(Operation::AfterInstall, |_, installer| {
            installer.insert(vec![Step::pop(), Step::pop()])?;
            Ok(Frame::new(""))
        });
    });
    let sw = software("seed", vec![Step::new(Operation::AfterInstall, "")]);

    let (result, _) = run(&rt, &sw);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::StackUnderflow);
}

#[test]
fn test_handler_can_take_its_children() {
    let rt = runtime_with(|r| {
        r.register(Operation::Set, basic::set);
        r.register_fn(Operation::Adb, |_, installer| {
            let children = installer.children();
            Ok(Frame::new(children.len().to_string()))
        });
    });
    let sw = software(
        "",
        vec![
            Step::new(Operation::Adb, "devices"),
            Step::new(Operation::Set, "skipped"),
            Step::pop(),
            Step::pop(),
            Step::new(Operation::Set, "after"),
            Step::pop(),
        ],
    );

    let (result, reporter) = run(&rt, &sw);
    result.unwrap();
    // The children are SET and POP; the step's own POP still runs.
    assert_eq!(reported_values(&reporter), vec!["2", "after"]);
}

#[test]
fn test_reboot_now_goes_through_facts() {
    use recipe_installer::{OsFacts, Resolver, Runtime, StaticFacts};
    use std::sync::Arc;

    let facts = Arc::new(StaticFacts::new(
        recipe_installer::OsFamily::Mac,
        recipe_installer::Arch::Aarch64,
    ));
    let mut registry = recipe_installer::HandlerRegistry::new();
    registry.register(Operation::RebootNow, basic::reboot_now);
    let rt = Runtime::new(
        registry,
        Resolver::new(Box::new(FixedConstants)).unwrap(),
        Arc::clone(&facts) as Arc<dyn OsFacts>,
    );
    let sw = software("", vec![Step::new(Operation::RebootNow, "")]);

    let (result, _) = run(&rt, &sw);
    result.unwrap();
    assert!(facts.rebooted());
}
