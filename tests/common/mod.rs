// Shared test helpers: an in-memory reporting service and config builders.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;

use slick_reporter::config::{LoggingSection, ReporterConfig, SlickSection, TestSection};
use slick_reporter::core::models::{
    Build, Component, Project, Release, TestPlan, TestResult, Testcase, Testrun, VersionInfo,
};
use slick_reporter::infra::slick::{ClientError, ReportingClient};

/// Everything the fake server has seen or stored.
#[derive(Debug, Default)]
pub struct FakeState {
    pub projects: Vec<Project>,
    pub testplans: Vec<TestPlan>,
    pub testcases: Vec<Testcase>,
    pub testruns: Vec<Testrun>,
    pub testrun_updates: Vec<Testrun>,
    pub results: Vec<TestResult>,
    pub creates: Vec<String>,
    next_id: u32,
}

impl FakeState {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }
}

/// An in-memory `ReportingClient` that records every create call.
#[derive(Debug, Default)]
pub struct FakeSlick {
    pub state: Mutex<FakeState>,
    /// Panic when filing the result with this index (0-based).
    pub panic_on_result: Option<usize>,
}

impl FakeSlick {
    pub fn with_project(project: Project) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().projects.push(project);
        fake
    }

    pub fn creates(&self) -> Vec<String> {
        self.state.lock().unwrap().creates.clone()
    }

    pub fn results(&self) -> Vec<TestResult> {
        self.state.lock().unwrap().results.clone()
    }

    pub fn testrun_updates(&self) -> Vec<Testrun> {
        self.state.lock().unwrap().testrun_updates.clone()
    }

    pub fn seed_testplan(&self, plan: TestPlan) {
        self.state.lock().unwrap().testplans.push(plan);
    }

    pub fn seed_testcase(&self, case: Testcase) {
        self.state.lock().unwrap().testcases.push(case);
    }
}

#[async_trait]
impl ReportingClient for FakeSlick {
    fn base_url(&self) -> &str {
        "http://fake-slick"
    }

    async fn get_service_version(&self) -> Result<VersionInfo, ClientError> {
        Ok(VersionInfo {
            product_name: "Slick".to_string(),
            version_string: "1.0.0-test".to_string(),
        })
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state.projects.iter().find(|p| p.name == name).cloned())
    }

    async fn create_release(&self, project_id: &str, release: &Release) -> Result<Release, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(format!("release:{}", release.name));
        let created = Release {
            id: state.next_id("release"),
            ..release.clone()
        };
        if let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) {
            project.releases.push(created.clone());
        }
        Ok(created)
    }

    async fn create_build(
        &self,
        project_id: &str,
        release_id: &str,
        build: &Build,
    ) -> Result<Build, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(format!("build:{}", build.name));
        let created = Build {
            id: state.next_id("build"),
            ..build.clone()
        };
        if let Some(release) = state
            .projects
            .iter_mut()
            .filter(|p| p.id == project_id)
            .flat_map(|p| p.releases.iter_mut())
            .find(|r| r.id == release_id)
        {
            release.builds.push(created.clone());
        }
        Ok(created)
    }

    async fn create_component(
        &self,
        project_id: &str,
        component: &Component,
    ) -> Result<Component, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(format!("component:{}", component.name));
        let created = Component {
            id: state.next_id("component"),
            ..component.clone()
        };
        if let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) {
            project.components.push(created.clone());
        }
        Ok(created)
    }

    async fn find_testplan(&self, project_id: &str, name: &str) -> Result<Option<TestPlan>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .testplans
            .iter()
            .find(|plan| {
                plan.name == name && plan.project.as_ref().is_none_or(|p| p.id == project_id)
            })
            .cloned())
    }

    async fn create_testplan(&self, testplan: &TestPlan) -> Result<TestPlan, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(format!("testplan:{}", testplan.name));
        let created = TestPlan {
            id: state.next_id("testplan"),
            ..testplan.clone()
        };
        state.testplans.push(created.clone());
        Ok(created)
    }

    async fn create_testrun(&self, testrun: &Testrun) -> Result<Testrun, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(format!("testrun:{}", testrun.name));
        let created = Testrun {
            id: state.next_id("testrun"),
            ..testrun.clone()
        };
        state.testruns.push(created.clone());
        Ok(created)
    }

    async fn update_testrun(&self, testrun: &Testrun) -> Result<Testrun, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.testrun_updates.push(testrun.clone());
        Ok(testrun.clone())
    }

    async fn find_testcase(&self, _project_id: &str, name: &str) -> Result<Option<Testcase>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state.testcases.iter().find(|case| case.name == name).cloned())
    }

    async fn create_testcase(&self, testcase: &Testcase) -> Result<Testcase, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(format!("testcase:{}", testcase.name));
        let created = Testcase {
            id: state.next_id("testcase"),
            ..testcase.clone()
        };
        state.testcases.push(created.clone());
        Ok(created)
    }

    async fn create_result(&self, result: &TestResult) -> Result<TestResult, ClientError> {
        let mut state = self.state.lock().unwrap();
        if self.panic_on_result == Some(state.results.len()) {
            drop(state);
            panic!("result storage exploded");
        }
        let created = TestResult {
            id: state.next_id("result"),
            ..result.clone()
        };
        state.results.push(created.clone());
        Ok(created)
    }
}

/// A project with one release ("1.0") holding one build ("7") and one component ("api").
pub fn populated_project() -> Project {
    Project {
        id: "project-1".to_string(),
        name: "Demo".to_string(),
        releases: vec![Release {
            id: "release-1".to_string(),
            name: "1.0".to_string(),
            builds: vec![Build {
                id: "build-1".to_string(),
                name: "7".to_string(),
            }],
        }],
        components: vec![Component {
            id: "component-1".to_string(),
            name: "api".to_string(),
        }],
    }
}

/// A project with nothing below it.
pub fn empty_project() -> Project {
    Project {
        id: "project-1".to_string(),
        name: "Demo".to_string(),
        ..Project::default()
    }
}

pub fn slick_section(build: Option<&str>) -> SlickSection {
    SlickSection {
        url: "http://fake-slick".to_string(),
        project: "Demo".to_string(),
        release: "1.0".to_string(),
        build: build.map(str::to_string),
        build_command: None,
        build_regex: None,
        component: Some("api".to_string()),
        testplan: None,
    }
}

pub fn test_section(command: &str, output_regex: &str) -> TestSection {
    TestSection {
        command: Some(command.to_string()),
        output_regex: Some(output_regex.to_string()),
        ..TestSection::default()
    }
}

pub fn reporter_config(command: &str, output_regex: &str) -> ReporterConfig {
    ReporterConfig {
        slick: slick_section(Some("7")),
        test: test_section(command, output_regex),
        logging: LoggingSection::default(),
    }
}
