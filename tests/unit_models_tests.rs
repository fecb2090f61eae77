//! # Models Unit Tests / 数据模型单元测试
//!
//! Tests for result records built from a run context and for the wire
//! format of the remote entities.
//!
//! 测试由运行上下文构建的结果记录以及远程实体的传输格式。

use slick_reporter::core::models::{EntityRef, RunContext, RunStatus, TestRunHandle, Testrun};

fn context() -> RunContext {
    RunContext {
        project: EntityRef::new("p1", "Demo"),
        release: EntityRef::new("r1", "1.0"),
        build: EntityRef::new("b1", "7"),
        component: None,
        testplan: None,
        testrun: TestRunHandle::new(Testrun {
            id: "run1".to_string(),
            name: "Nightly".to_string(),
            ..Testrun::default()
        }),
    }
}

#[test]
fn test_result_start_precedes_record_by_runlength() {
    let result = context().result_for(EntityRef::new("tc1", "login"), "PASS".to_string(), String::new(), 450);

    assert_eq!(result.started, result.recorded - 450);
    assert_eq!(result.testrun, EntityRef::new("run1", "Nightly"));
    assert_eq!(result.component, None);
}

#[test]
fn test_extreme_runlength_saturates() {
    let context = context();

    let low = context.result_for(EntityRef::new("tc1", "a"), "PASS".to_string(), String::new(), i64::MIN);
    assert_eq!(low.started, i64::MAX);

    let high = context.result_for(EntityRef::new("tc1", "a"), "PASS".to_string(), String::new(), i64::MAX);
    assert!(high.started < 0);
}

#[test]
fn test_testrun_wire_format() {
    let run = Testrun {
        id: "run1".to_string(),
        state: Some(RunStatus::Finished),
        run_finished: Some(2000),
        ..Testrun::default()
    };
    let value = serde_json::to_value(&run).unwrap();

    assert_eq!(value["state"], "FINISHED");
    assert_eq!(value["runFinished"], 2000);
    assert!(value.get("runStarted").is_none());
}
