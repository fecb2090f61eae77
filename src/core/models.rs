//! # Data Models Module / 数据模型模块
//!
//! This module defines the records exchanged with the Slick server and the
//! local structures built from them: entity references, the run context that
//! the classifier consumes, and summaries of filed results.
//!
//! 此模块定义与 Slick 服务器交换的记录以及由其构建的本地结构：
//! 实体引用、分类器使用的运行上下文，以及已提交结果的摘要。

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::infra::slick::{ClientError, ReportingClient};

/// Status filed when neither a status template nor a `result` group is available.
pub const BROKEN_TEST: &str = "BROKEN_TEST";

/// Creator identity recorded on test plans created by this tool.
pub const CREATED_BY: &str = "slick-reporter";

/// Current wall-clock time in epoch milliseconds.
/// 当前的墙上时间（纪元毫秒）。
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A lightweight (id, name) pair identifying a remote entity.
/// It never owns the entity, it only names it.
///
/// 标识远程实体的轻量级 (id, name) 对。它从不拥有实体，只用于标识。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (id: {})", self.name, self.id)
    }
}

/// The top of the hierarchy. Projects are looked up, never created.
/// 层级结构的顶层。项目只会被查找，永远不会被创建。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub releases: Vec<Release>,
    #[serde(default)]
    pub components: Vec<Component>,
}

/// A release of a project. Holds the builds known for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub builds: Vec<Build>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityRef>,
    #[serde(default)]
    pub isprivate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testcase {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityRef>,
}

macro_rules! impl_reference {
    ($($entity:ty),* $(,)?) => {
        $(
            impl $entity {
                /// Returns the (id, name) reference of this entity.
                pub fn reference(&self) -> EntityRef {
                    EntityRef::new(self.id.clone(), self.name.clone())
                }
            }
        )*
    };
}

impl_reference!(Project, Release, Build, Component, TestPlan, Testcase, Testrun);

/// Lifecycle state of a test run. A run moves from `Running` to `Finished` once.
/// 测试运行的生命周期状态。运行只会从 `Running` 转为 `Finished` 一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testrun {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testplan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_started: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_finished: Option<i64>,
}

/// One filed result. Results are written once and never updated.
/// 一条已提交的结果。结果只写入一次，永不更新。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub testrun: EntityRef,
    pub testcase: EntityRef,
    pub project: EntityRef,
    pub release: EntityRef,
    pub build: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<EntityRef>,
    pub status: String,
    #[serde(default)]
    pub reason: String,
    pub runlength: i64,
    pub started: i64,
    pub recorded: i64,
}

/// Product and version reported by the server's health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub product_name: String,
    pub version_string: String,
}

/// The test run owned by a run context, finalized exactly once.
///
/// 运行上下文拥有的测试运行，只会被结束一次。
#[derive(Debug)]
pub struct TestRunHandle {
    run: Testrun,
    finished: bool,
}

impl TestRunHandle {
    pub fn new(run: Testrun) -> Self {
        Self {
            run,
            finished: false,
        }
    }

    pub fn run(&self) -> &Testrun {
        &self.run
    }

    pub fn reference(&self) -> EntityRef {
        self.run.reference()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Marks the run `FINISHED` on the server. Calls after the first success
    /// do nothing. The finish timestamp never precedes the start timestamp.
    ///
    /// 在服务器上将运行标记为 `FINISHED`。首次成功之后的调用不做任何事。
    /// 结束时间戳永远不早于开始时间戳。
    pub async fn finish(&mut self, client: &dyn ReportingClient) -> Result<(), ClientError> {
        if self.finished {
            return Ok(());
        }
        let started = self.run.run_started.unwrap_or(i64::MIN);
        let update = Testrun {
            id: self.run.id.clone(),
            state: Some(RunStatus::Finished),
            run_finished: Some(now_millis().max(started)),
            ..Testrun::default()
        };
        client.update_testrun(&update).await?;
        self.run.state = update.state;
        self.run.run_finished = update.run_finished;
        self.finished = true;
        Ok(())
    }
}

/// Everything the classifier needs to file results, resolved once per invocation.
/// Only the test run changes after construction.
///
/// 分类器提交结果所需的一切，每次调用解析一次。构造之后只有测试运行会变化。
#[derive(Debug)]
pub struct RunContext {
    pub project: EntityRef,
    pub release: EntityRef,
    pub build: EntityRef,
    pub component: Option<EntityRef>,
    pub testplan: Option<EntityRef>,
    pub testrun: TestRunHandle,
}

impl RunContext {
    /// Builds the result record for a classified line, ending now.
    pub fn result_for(
        &self,
        testcase: EntityRef,
        status: String,
        reason: String,
        runlength: i64,
    ) -> TestResult {
        let recorded = now_millis();
        TestResult {
            id: String::new(),
            testrun: self.testrun.reference(),
            testcase,
            project: self.project.clone(),
            release: self.release.clone(),
            build: self.build.clone(),
            component: self.component.clone(),
            status,
            reason,
            runlength,
            started: recorded.saturating_sub(runlength),
            recorded,
        }
    }
}

/// Local record of a filed result, used for the console summary.
/// 已提交结果的本地记录，用于控制台摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiledResult {
    pub id: String,
    pub name: String,
    pub status: String,
    pub runlength: i64,
}

/// What happened while running the command under test.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub filed: Vec<FiledResult>,
    pub lines_read: usize,
    pub exit_code: Option<i32>,
}
