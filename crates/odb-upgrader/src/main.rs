use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use odb_core::{LoggingListener, Upgrader};
use odb_upgrader::{init_logging, HttpBroker, LogFormat, UpgraderFileConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("upgrade-all-service-instances")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upgrade every service instance of an on-demand broker")
        .arg(
            Arg::new("config")
                .long("config")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to the upgrader YAML config"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Log as JSON lines"),
        )
        .get_matches();

    init_logging(if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let config_path = matches
        .get_one::<PathBuf>("config")
        .context("--config is required")?;
    let config = UpgraderFileConfig::load(config_path)?;

    let broker = Arc::new(HttpBroker::new(
        config.broker_api.clone(),
        config.request_timeout(),
    )?);
    let upgrader = Upgrader::new(
        broker.clone(),
        broker,
        Arc::new(LoggingListener),
        config.upgrader_config(),
    );

    let cancel = upgrader.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the in-flight upgrade");
            cancel.cancel();
        }
    });

    let report = upgrader.upgrade().await.context("upgrade campaign failed")?;

    for failure in &report.failures {
        tracing::error!(instance_id = %failure.instance_id, reason = %failure.reason, "service instance upgrade failed");
    }

    if !report.is_success() {
        anyhow::bail!(
            "upgrade campaign {:?} with {} failed instances",
            report.outcome,
            report.failures.len()
        );
    }
    Ok(())
}
