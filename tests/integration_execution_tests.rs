//! # Execution Integration Tests / 执行集成测试
//!
//! Runs real shell commands through `CommandTester` and `run_and_finalize`
//! against the in-memory `FakeSlick`, checking what gets filed and that the
//! test run is finalized exactly once on every way out.
//!
//! 通过 `CommandTester` 和 `run_and_finalize` 针对内存中的 `FakeSlick` 运行真实的 shell 命令，
//! 检查提交了哪些内容，以及测试运行在每种退出方式下都只被结束一次。

#![cfg(unix)]

mod common;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;

use common::{FakeSlick, populated_project, reporter_config, slick_section, test_section};
use slick_reporter::ReporterError;
use slick_reporter::cli::commands::run::run_with;
use slick_reporter::core::classifier::OutputClassifier;
use slick_reporter::core::context::ContextResolver;
use slick_reporter::core::execution::{CommandTester, run_and_finalize};
use slick_reporter::core::models::{EntityRef, RunStatus, Testcase, now_millis};

const PATTERN: &str = r"\[(?P<result>\w+)\] (?P<name>[^|]+?) \| (?P<runlength>\d+)";

const OUTPUT: &str = "printf 'starting suite\\n[PASS] login | 120\\nnoise\\n[FAIL] search | 340\\n[PASS] logout | 15\\n'";

#[tokio::test]
async fn test_matching_lines_are_filed_in_order() {
    let fake = FakeSlick::with_project(populated_project());
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    let classifier = OutputClassifier::from_config(&test_section(OUTPUT, PATTERN)).unwrap();
    let mut tester = CommandTester::new(&fake, classifier);

    let outcome = run_and_finalize(&mut tester, &mut context).await.unwrap();

    assert_eq!(outcome.lines_read, 5);
    assert_eq!(outcome.exit_code, Some(0));
    let filed: Vec<_> = outcome
        .filed
        .iter()
        .map(|r| (r.name.as_str(), r.status.as_str(), r.runlength))
        .collect();
    assert_eq!(filed, vec![("login", "PASS", 120), ("search", "FAIL", 340), ("logout", "PASS", 15)]);

    let results = fake.results();
    assert_eq!(results.len(), 3);
    let run = context.testrun.reference();
    for result in &results {
        assert_eq!(result.testrun, run);
        assert_eq!(result.project, EntityRef::new("project-1", "Demo"));
        assert_eq!(result.build, EntityRef::new("build-1", "7"));
        assert_eq!(result.component, Some(EntityRef::new("component-1", "api")));
        assert_eq!(result.started, result.recorded - result.runlength);
    }
}

#[tokio::test]
async fn test_existing_testcases_are_reused() {
    let fake = FakeSlick::with_project(populated_project());
    fake.seed_testcase(Testcase {
        id: "testcase-login".to_string(),
        name: "login".to_string(),
        project: Some(EntityRef::new("project-1", "Demo")),
    });
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    let classifier = OutputClassifier::from_config(&test_section(OUTPUT, PATTERN)).unwrap();

    run_and_finalize(&mut CommandTester::new(&fake, classifier), &mut context)
        .await
        .unwrap();

    let testcase_creates: Vec<_> = fake
        .creates()
        .into_iter()
        .filter(|c| c.starts_with("testcase:"))
        .collect();
    assert_eq!(testcase_creates, vec!["testcase:search", "testcase:logout"]);
    assert_eq!(fake.results()[0].testcase, EntityRef::new("testcase-login", "login"));
}

#[tokio::test]
async fn test_testrun_finalized_once_after_start() {
    let fake = FakeSlick::with_project(populated_project());
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    let classifier = OutputClassifier::from_config(&test_section("echo nothing to see", PATTERN)).unwrap();
    let mut tester = CommandTester::new(&fake, classifier);

    let outcome = run_and_finalize(&mut tester, &mut context).await.unwrap();
    assert!(outcome.filed.is_empty());

    // A second finish is a no-op.
    context.testrun.finish(&fake).await.unwrap();

    let updates = fake.testrun_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, context.testrun.run().id);
    assert_eq!(updates[0].state, Some(RunStatus::Finished));
    let started = context.testrun.run().run_started.unwrap();
    assert!(updates[0].run_finished.unwrap() >= started);
    assert!(context.testrun.is_finished());
}

#[tokio::test]
async fn test_finalized_when_classification_fails_partway() {
    let fake = FakeSlick::with_project(populated_project());
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    // The reason template refers to a group the pattern does not have.
    let mut section = test_section(
        "printf '[PASS] one | 1\\n[PASS] two | 2\\n'",
        r"\[(?P<result>\w+)\] (?P<name>\w+) \| (?P<runlength>\d+)",
    );
    section.reason = Some("{name}{3}".to_string());
    let classifier = OutputClassifier::from_config(&section).unwrap();
    let mut tester = CommandTester::new(&fake, classifier);

    let err = run_and_finalize(&mut tester, &mut context).await.unwrap_err();

    assert!(matches!(err, ReporterError::Classification { .. }));
    assert!(fake.results().is_empty());
    assert_eq!(fake.testrun_updates().len(), 1);
    assert!(context.testrun.is_finished());
}

#[tokio::test]
async fn test_finalized_when_filing_panics() {
    let fake = FakeSlick {
        panic_on_result: Some(1),
        ..FakeSlick::with_project(populated_project())
    };
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    let classifier = OutputClassifier::from_config(&test_section(OUTPUT, PATTERN)).unwrap();
    let mut tester = CommandTester::new(&fake, classifier);

    let caught = AssertUnwindSafe(run_and_finalize(&mut tester, &mut context))
        .catch_unwind()
        .await;

    assert!(caught.is_err(), "the panic is re-raised after finalization");
    assert_eq!(fake.results().len(), 1);
    assert_eq!(fake.testrun_updates().len(), 1);
    assert!(context.testrun.is_finished());
}

#[tokio::test]
async fn test_stderr_is_classified_too() {
    let fake = FakeSlick::with_project(populated_project());
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    let classifier =
        OutputClassifier::from_config(&test_section("echo '[FAIL] crash | 9' >&2; exit 4", PATTERN)).unwrap();
    let mut tester = CommandTester::new(&fake, classifier);

    let outcome = run_and_finalize(&mut tester, &mut context).await.unwrap();

    assert_eq!(outcome.filed.len(), 1);
    assert_eq!(outcome.filed[0].status, "FAIL");
    assert_eq!(outcome.exit_code, Some(4));
}

#[tokio::test]
async fn test_bad_test_settings_create_nothing() {
    let fake = FakeSlick::with_project(populated_project());
    let mut config = reporter_config("echo hi", PATTERN);
    config.test.output_regex = None;

    let err = run_with(&fake, &config, "en").await.unwrap_err();

    assert_eq!(slick_reporter::exit_code_for(&err), 5);
    assert!(fake.creates().is_empty());
}

#[tokio::test]
async fn test_full_run_against_fake_service() {
    let fake = FakeSlick::with_project(populated_project());
    let config = reporter_config(OUTPUT, PATTERN);

    run_with(&fake, &config, "en").await.unwrap();

    assert_eq!(fake.results().len(), 3);
    assert_eq!(fake.testrun_updates().len(), 1);
}

#[tokio::test]
async fn test_lines_are_filed_while_the_command_runs() {
    let fake = FakeSlick::with_project(populated_project());
    let mut context = ContextResolver::new(&fake)
        .resolve(&slick_section(Some("7")))
        .await
        .unwrap();
    let classifier = OutputClassifier::from_config(&test_section(
        "printf '[PASS] early | 5\\n'; sleep 1; printf '[PASS] late | 5\\n'",
        PATTERN,
    ))
    .unwrap();
    let mut tester = CommandTester::new(&fake, classifier);

    run_and_finalize(&mut tester, &mut context).await.unwrap();
    let command_done = now_millis();

    let results = fake.results();
    assert_eq!(results.len(), 2);
    // The first result was filed before the sleep ended, not after the command exited.
    assert!(
        results[0].recorded + 500 <= command_done,
        "first result recorded at {}, command done at {}",
        results[0].recorded,
        command_done
    );
    assert!(results[1].recorded - results[0].recorded >= 900);
}
