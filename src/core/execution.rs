//! # Test Execution Module / 测试执行模块
//!
//! Runs the command under test, classifies its output as it arrives, and files
//! one result per matching line. The test run is finalized on every way out,
//! including errors and panics raised while classifying or filing.
//!
//! 运行被测命令，在输出到达时进行分类，并为每个匹配行提交一条结果。
//! 无论以何种方式退出（包括分类或提交时产生的错误和 panic），测试运行都会被结束。

use futures::FutureExt;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::time::Instant;

use crate::core::classifier::{Classification, OutputClassifier};
use crate::core::error::{ReporterError, Result};
use crate::core::models::{FiledResult, RunContext, RunOutcome, Testcase};
use crate::core::resolve::{Resolved, find_or_create};
use crate::infra::command::LineStream;
use crate::infra::slick::ReportingClient;

/// Runs one command and files its classified output against a run context.
///
/// 运行一个命令，并将其分类后的输出提交到运行上下文。
pub struct CommandTester<'a> {
    client: &'a dyn ReportingClient,
    classifier: OutputClassifier,
}

impl<'a> CommandTester<'a> {
    pub fn new(client: &'a dyn ReportingClient, classifier: OutputClassifier) -> Self {
        Self { client, classifier }
    }

    /// Spawns the command and processes its output line by line until it ends.
    ///
    /// Lines are handled as they arrive; the output is never buffered whole.
    /// A line that does not match is dropped.
    pub async fn run(&mut self, context: &RunContext) -> Result<RunOutcome> {
        let command_line = self.classifier.command().to_string();
        tracing::info!("Running command <<{}>> and examining its output.", command_line);

        let mut lines = LineStream::spawn(&command_line)
            .map_err(|e| ReporterError::io(format!("spawning <<{command_line}>>"), e))?;
        self.classifier.start_clock(Instant::now());

        let mut outcome = RunOutcome::default();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ReporterError::io(format!("reading output of <<{command_line}>>"), e))?
        {
            outcome.lines_read += 1;
            tracing::trace!("Testing output line <<{}>> against the output pattern.", line);
            if let Some(classification) = self.classifier.classify(&line, Instant::now())? {
                let filed = self.file_result(context, classification).await?;
                outcome.filed.push(filed);
            }
        }

        let status = lines
            .wait()
            .await
            .map_err(|e| ReporterError::io(format!("waiting for <<{command_line}>>"), e))?;
        tracing::info!("Command <<{}>> exited with {}.", command_line, status);
        outcome.exit_code = status.code();
        Ok(outcome)
    }

    /// Files one result, creating its test case if needed.
    pub async fn file_result(
        &self,
        context: &RunContext,
        classification: Classification,
    ) -> Result<FiledResult> {
        let unreachable = |e| ReporterError::unreachable(self.client.base_url(), e);
        let Classification {
            name,
            status,
            reason,
            runlength,
            ..
        } = classification;

        let found = self
            .client
            .find_testcase(&context.project.id, &name)
            .await
            .map_err(unreachable)?;
        let Resolved { entity: testcase, created } = find_or_create(found, || async {
            tracing::debug!("Creating testcase with name '{}' on project '{}'.", name, context.project.name);
            let testcase = Testcase {
                name: name.clone(),
                project: Some(context.project.clone()),
                ..Testcase::default()
            };
            self.client.create_testcase(&testcase).await
        })
        .await
        .map_err(unreachable)?;
        if created {
            tracing::info!("Using newly created testcase {} for result.", testcase.reference());
        } else {
            tracing::info!("Found testcase {} for result.", testcase.reference());
        }

        let result = context.result_for(testcase.reference(), status, reason, runlength);
        tracing::debug!("Filing result of '{}' for test with name '{}'", result.status, name);
        let filed = self.client.create_result(&result).await.map_err(unreachable)?;
        tracing::info!(
            "Filed result of '{}' for test '{}', result id: {}",
            filed.status, name, filed.id
        );

        Ok(FiledResult {
            id: filed.id,
            name,
            status: result.status,
            runlength: result.runlength,
        })
    }
}

/// Runs `tester` and finalizes the context's test run afterwards, whatever
/// happened. A panic during the run is re-raised after finalization.
///
/// A finalization failure is logged; if the run itself succeeded it is
/// returned as the error.
///
/// 运行 `tester`，并在之后无论发生什么都结束上下文中的测试运行。
/// 运行期间的 panic 会在结束之后重新抛出。
pub async fn run_and_finalize(
    tester: &mut CommandTester<'_>,
    context: &mut RunContext,
) -> Result<RunOutcome> {
    let client = tester.client;
    let outcome = AssertUnwindSafe(tester.run(context)).catch_unwind().await;

    let finished = context.testrun.finish(client).await;
    if let Err(e) = &finished {
        tracing::error!("Unable to mark testrun {} finished: {}", context.testrun.reference(), e);
    } else {
        tracing::info!("Marked testrun {} finished.", context.testrun.reference());
    }

    match outcome {
        Err(panic) => resume_unwind(panic),
        Ok(Err(e)) => Err(e),
        Ok(Ok(outcome)) => {
            finished.map_err(|e| ReporterError::unreachable(client.base_url(), e))?;
            Ok(outcome)
        }
    }
}
