//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command for the Slick Reporter CLI:
//! load the configuration, check the server, resolve the reporting
//! hierarchy, run the command and file its results.
//!
//! 此模块实现了 Slick Reporter CLI 的 `run` 命令：
//! 加载配置、检查服务器、解析报告层级、运行命令并提交其结果。

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::{
    core::{
        classifier::OutputClassifier,
        config::{self, Overrides, ReporterConfig},
        context::ContextResolver,
        error::ReporterError,
        execution::{CommandTester, run_and_finalize},
    },
    infra::{
        logging::LoggingGuard,
        slick::{ReportingClient, SlickClient},
        t,
    },
    reporting::console::print_summary,
};

/// Executes the run command with the provided arguments.
///
/// # Arguments
/// * `config_path` - Path to the configuration file
/// * `overrides` - Command-line values that take precedence over the file
/// * `locale` - Language for console messages
///
/// # Returns
/// A Result indicating success or failure of the run. Failures carry a
/// `ReporterError` that decides the process exit code.
pub async fn execute(config_path: PathBuf, overrides: Overrides, locale: &str) -> Result<()> {
    let mut config = config::load_config(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    config.apply_overrides(&overrides);

    let _logging = LoggingGuard::init(&config.logging);
    tracing::info!("slick-reporter is initializing.");

    let client = SlickClient::new(&config.slick.url);
    match run_with(&client, &config, locale).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("{:#}", e);
            Err(e)
        }
    }
}

/// Runs everything after logging is set up, against any reporting client.
pub async fn run_with(
    client: &dyn ReportingClient,
    config: &ReporterConfig,
    locale: &str,
) -> Result<()> {
    validate_connection(client, locale).await?;

    // Test settings are checked before anything is created on the server.
    let classifier = OutputClassifier::from_config(&config.test)?;

    let resolver = ContextResolver::new(client);
    let mut context = resolver.resolve(&config.slick).await?;

    let mut tester = CommandTester::new(client, classifier);
    let outcome = run_and_finalize(&mut tester, &mut context).await?;

    print_summary(&context.testrun.reference(), &outcome, locale);
    Ok(())
}

/// Asks the server for its version; a failure here stops the run.
/// 向服务器查询其版本；此处失败会终止运行。
pub async fn validate_connection(client: &dyn ReportingClient, locale: &str) -> Result<()> {
    tracing::debug!("Attempting to connect to slick at url {}", client.base_url());
    let version = client
        .get_service_version()
        .await
        .map_err(|e| ReporterError::unreachable(client.base_url(), e))?;
    tracing::info!(
        "Connected to {} version {} at url {}",
        version.product_name, version.version_string, client.base_url()
    );
    println!(
        "{}",
        t!(
            "run.connected",
            locale = locale,
            product = &version.product_name,
            version = &version.version_string,
            url = client.base_url()
        )
        .cyan()
    );
    Ok(())
}
