//! # Context Resolver Module / 上下文解析模块
//!
//! Resolves the reporting hierarchy (project, release, build, component, test
//! plan) against the Slick server, creating what is missing below the
//! project, and opens a new test run. The result is the `RunContext` the
//! classifier files results against.
//!
//! 在 Slick 服务器上解析报告层级（项目、发布、构建、组件、测试计划），
//! 创建项目之下缺失的实体，并开启新的测试运行。结果是分类器提交结果所用的 `RunContext`。

use regex::{Regex, RegexBuilder};

use crate::core::config::SlickSection;
use crate::core::error::{ReporterError, Result};
use crate::core::models::{
    Build, CREATED_BY, Component, EntityRef, Project, Release, RunContext, RunStatus,
    TestPlan, TestRunHandle, Testrun, now_millis,
};
use crate::core::resolve::{Resolved, find_named, find_or_create};
use crate::infra::command;
use crate::infra::slick::{ClientError, ReportingClient};

pub const DEFAULT_TESTRUN_NAME: &str = "Tests run from slick-reporter";

/// How the build identifier is obtained.
/// 获取构建标识的方式。
#[derive(Debug, Clone)]
pub enum BuildSource {
    /// Use the configured identifier as is.
    Explicit(String),
    /// Run a command and extract the `build` group from its output.
    Discover { command: String, pattern: Regex },
    /// Discover, and use the configured identifier if discovery yields nothing.
    DiscoverOrFallback {
        command: String,
        pattern: Regex,
        fallback: String,
    },
}

impl BuildSource {
    /// Classifies the build settings of the `[slick]` table.
    ///
    /// Accepted shapes are an explicit build, a command with a pattern, or
    /// both. A pattern without a command is ignored in favour of the explicit
    /// build. Anything else is a configuration error, as is an invalid pattern.
    ///
    /// 对 `[slick]` 表的构建设置进行分类。可接受的形式为：显式构建、命令加模式，或两者都有。
    pub fn from_config(
        build: Option<&str>,
        command: Option<&str>,
        regex: Option<&str>,
    ) -> Result<Self> {
        let pattern = regex.map(compile_discovery).transpose()?;
        match (build, command, pattern) {
            (Some(build), Some(command), Some(pattern)) => Ok(BuildSource::DiscoverOrFallback {
                command: command.to_string(),
                pattern,
                fallback: build.to_string(),
            }),
            (None, Some(command), Some(pattern)) => Ok(BuildSource::Discover {
                command: command.to_string(),
                pattern,
            }),
            (Some(build), None, _) => Ok(BuildSource::Explicit(build.to_string())),
            (Some(_), Some(_), None) => Err(ReporterError::Configuration(
                "build_command is set without build_regex; either supply a build, or use build_command and build_regex"
                    .to_string(),
            )),
            (None, _, _) => Err(ReporterError::Configuration(
                "no build was specified; set build in the [slick] section, or use build_command and build_regex"
                    .to_string(),
            )),
        }
    }

    /// Produces the build identifier, running the discovery command if needed.
    ///
    /// A failing discovery command or a pattern without a `build` group is
    /// logged; only the absence of any identifier is an error.
    pub async fn resolve(&self) -> Result<String> {
        let discovered = match self {
            BuildSource::Explicit(build) => return Ok(build.clone()),
            BuildSource::Discover { command, pattern }
            | BuildSource::DiscoverOrFallback { command, pattern, .. } => {
                match discover_build(command, pattern).await {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        None
                    }
                }
            }
        };
        let fallback = match self {
            BuildSource::DiscoverOrFallback { fallback, .. } => Some(fallback.clone()),
            _ => None,
        };
        discovered.or(fallback).ok_or_else(|| {
            ReporterError::Configuration(
                "no build number was found; set build in the [slick] section, or check build_command and build_regex"
                    .to_string(),
            )
        })
    }
}

fn compile_discovery(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|e| {
            ReporterError::Configuration(format!("regular expression <<{pattern}>> is not valid: {e}"))
        })
}

/// Runs the discovery command and searches its output once for `build`.
///
/// `Ok(None)` means the command ran but nothing usable was found.
pub async fn discover_build(command_line: &str, pattern: &Regex) -> Result<Option<String>> {
    tracing::debug!("Running command <<{}>> and examining output for build number.", command_line);
    let (status, output) = command::capture_output(command_line).await.map_err(|e| {
        ReporterError::DiscoveryCommand {
            command: command_line.to_string(),
            message: e.to_string(),
        }
    })?;
    if !status.success() {
        return Err(ReporterError::DiscoveryCommand {
            command: command_line.to_string(),
            message: format!("invalid return code {status}, output: {}", output.trim()),
        });
    }
    Ok(extract_build(pattern, &output))
}

/// Applies the discovery pattern to command output and returns the `build` group.
/// 将发现模式应用于命令输出并返回 `build` 分组。
pub fn extract_build(pattern: &Regex, output: &str) -> Option<String> {
    let captures = pattern.captures(output)?;
    tracing::debug!("Found a match to regular expression, looking for 'build' in match.");
    if !pattern.capture_names().flatten().any(|name| name == "build") {
        tracing::error!(
            "Unable to find 'build' group in match. Did you include a (?P<build>) group in your regular expression?"
        );
        return None;
    }
    let build = captures.name("build")?.as_str().to_string();
    tracing::debug!("Found build name '{}' in output from command.", build);
    Some(build)
}

/// Resolves the reporting hierarchy and opens a test run.
///
/// 解析报告层级并开启测试运行。
pub struct ContextResolver<'a> {
    client: &'a dyn ReportingClient,
}

impl<'a> ContextResolver<'a> {
    pub fn new(client: &'a dyn ReportingClient) -> Self {
        Self { client }
    }

    fn unreachable(&self, source: ClientError) -> ReporterError {
        ReporterError::unreachable(self.client.base_url(), source)
    }

    /// Resolves every level in dependency order and creates the test run.
    ///
    /// # Errors
    /// - `ServiceUnreachable` when the server cannot be talked to
    /// - `ProjectNotFound` when the project does not exist
    /// - `Configuration` when no build identifier can be produced
    pub async fn resolve(&self, slick: &SlickSection) -> Result<RunContext> {
        // Validate the build settings before touching the server.
        let build_source = BuildSource::from_config(
            slick.build.as_deref(),
            slick.build_command.as_deref(),
            slick.build_regex.as_deref(),
        )?;

        let mut project = self.find_project(&slick.project).await?;
        let release = self.resolve_release(&mut project, &slick.release).await?;
        let build_name = build_source.resolve().await?;
        let build = self.resolve_build(&project, &release, &build_name).await?;
        let component = match slick.component.as_deref() {
            Some(name) => Some(self.resolve_component(&project, name).await?),
            None => {
                tracing::warn!(
                    "No component specified in the [slick] section. Tests will not have an associated component."
                );
                None
            }
        };
        let testplan = match slick.testplan.as_deref() {
            Some(name) => Some(self.resolve_testplan(&project, name).await?),
            None => {
                tracing::warn!("No testplan specified for the testrun.");
                None
            }
        };
        let testrun = self
            .create_testrun(&project, &release, &build, testplan.as_ref())
            .await?;

        Ok(RunContext {
            project: project.reference(),
            release,
            build,
            component,
            testplan,
            testrun,
        })
    }

    pub async fn find_project(&self, name: &str) -> Result<Project> {
        tracing::debug!("Looking for project by name '{}'.", name);
        let project = self
            .client
            .find_project_by_name(name)
            .await
            .map_err(|e| self.unreachable(e))?
            .ok_or_else(|| {
                tracing::error!("Unable to find project with name '{}'", name);
                ReporterError::ProjectNotFound {
                    name: name.to_string(),
                    url: self.client.base_url().to_string(),
                }
            })?;
        tracing::info!("Found project with name '{}' and id: {}.", project.name, project.id);
        Ok(project)
    }

    /// Finds the release among the project's releases, or creates it and
    /// records it on the local project.
    pub async fn resolve_release(&self, project: &mut Project, name: &str) -> Result<EntityRef> {
        tracing::debug!("Looking for release '{}' in project '{}'", name, project.name);
        let found = find_named(&project.releases, name, |r| &r.name).cloned();
        let project_id = project.id.clone();
        let Resolved { entity, created } = find_or_create(found, || async {
            tracing::info!("Adding release {} to project {}.", name, project.name);
            let release = Release {
                name: name.to_string(),
                ..Release::default()
            };
            self.client.create_release(&project_id, &release).await
        })
        .await
        .map_err(|e| self.unreachable(e))?;

        let reference = entity.reference();
        if created {
            tracing::info!("Using newly created release {} in project '{}'.", reference, project.name);
            project.releases.push(entity);
        } else {
            tracing::info!("Found release {} in project '{}'.", reference, project.name);
        }
        Ok(reference)
    }

    /// Finds the build among the release's builds, or creates it.
    pub async fn resolve_build(&self, project: &Project, release: &EntityRef, name: &str) -> Result<EntityRef> {
        tracing::debug!(
            "Looking for an existing build {} in project {} and release {}.",
            name, project.name, release.name
        );
        let known = project
            .releases
            .iter()
            .find(|r| r.id == release.id)
            .map(|r| r.builds.as_slice())
            .unwrap_or_default();
        let found = find_named(known, name, |b| &b.name).cloned();
        let Resolved { entity, created } = find_or_create(found, || async {
            tracing::info!("Adding build {} to release {}.", name, release.name);
            let build = Build {
                name: name.to_string(),
                ..Build::default()
            };
            self.client.create_build(&project.id, &release.id, &build).await
        })
        .await
        .map_err(|e| self.unreachable(e))?;

        let reference = entity.reference();
        if created {
            tracing::info!(
                "Using newly created build {} in release '{}' in project '{}'.",
                reference, release.name, project.name
            );
        } else {
            tracing::debug!("Found build {} on release '{}'", reference, release.name);
        }
        Ok(reference)
    }

    pub async fn resolve_component(&self, project: &Project, name: &str) -> Result<EntityRef> {
        tracing::debug!("Looking for component with name '{}' in project '{}'", name, project.name);
        let found = find_named(&project.components, name, |c| &c.name).cloned();
        let Resolved { entity, created } = find_or_create(found, || async {
            tracing::info!("Adding component {} to project {}.", name, project.name);
            let component = Component {
                name: name.to_string(),
                ..Component::default()
            };
            self.client.create_component(&project.id, &component).await
        })
        .await
        .map_err(|e| self.unreachable(e))?;

        let reference = entity.reference();
        if created {
            tracing::info!("Using newly created component {} in project '{}'.", reference, project.name);
        } else {
            tracing::info!("Found component {} in project '{}'.", reference, project.name);
        }
        Ok(reference)
    }

    /// Finds the test plan by name within the project, or creates a public one.
    ///
    /// A failed lookup is logged and treated as "not found".
    pub async fn resolve_testplan(&self, project: &Project, name: &str) -> Result<EntityRef> {
        let found = match self.client.find_testplan(&project.id, name).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Unable to look up testplan '{}', creating it instead: {}", name, e);
                None
            }
        };
        let Resolved { entity, created } = find_or_create(found, || async {
            tracing::debug!("Creating testplan with name '{}' connected to project '{}'.", name, project.name);
            let testplan = TestPlan {
                name: name.to_string(),
                project: Some(project.reference()),
                isprivate: false,
                created_by: Some(CREATED_BY.to_string()),
                ..TestPlan::default()
            };
            self.client.create_testplan(&testplan).await
        })
        .await
        .map_err(|e| self.unreachable(e))?;

        let reference = entity.reference();
        if created {
            tracing::info!("Using newly created testplan {}.", reference);
        } else {
            tracing::info!("Found (and using) existing testplan {}.", reference);
        }
        Ok(reference)
    }

    /// Creates a new test run in the `RUNNING` state, started now.
    pub async fn create_testrun(
        &self,
        project: &Project,
        release: &EntityRef,
        build: &EntityRef,
        testplan: Option<&EntityRef>,
    ) -> Result<TestRunHandle> {
        let testrun = Testrun {
            name: match testplan {
                Some(plan) => format!("Testrun for testplan {}", plan.name),
                None => DEFAULT_TESTRUN_NAME.to_string(),
            },
            project: Some(project.reference()),
            release: Some(release.clone()),
            build: Some(build.clone()),
            testplan_id: testplan.map(|plan| plan.id.clone()),
            state: Some(RunStatus::Running),
            run_started: Some(now_millis()),
            ..Testrun::default()
        };
        tracing::debug!("Creating testrun with name {}.", testrun.name);
        let created = self
            .client
            .create_testrun(&testrun)
            .await
            .map_err(|e| self.unreachable(e))?;
        tracing::info!("Created testrun {}.", created.reference());

        // Keep the local start time if the server echoes a sparse record.
        Ok(TestRunHandle::new(Testrun {
            run_started: created.run_started.or(testrun.run_started),
            state: created.state.or(testrun.state),
            ..created
        }))
    }
}
