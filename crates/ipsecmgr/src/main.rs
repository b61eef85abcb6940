//! IPsec Manager entry point

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use ipsec_common::{logging, GrpcConnector, PingProber};
use ipsecmgr::cli::{Cli, Command};
use ipsecmgr::tunnel::{query_daemon, LifecycleReport};
use ipsecmgr::{StaticSaManager, TunnelOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let timeout = cli.timeout();
    let transport = cli
        .transport()
        .context("Invalid transport configuration")?
        .with_connect_timeout(timeout);
    info!(endpoint = %transport.endpoint, tls = transport.tls.is_some(), "Starting ipsecmgr");
    let connector = GrpcConnector::new(transport);

    match &cli.command {
        Command::AddSa(args) => {
            let id = args.id.identifier()?;
            let mgr = StaticSaManager::new(connector).with_timeout(timeout);
            mgr.add_sa(&id, &args.params()).await.context("AddSA failed")?;
            println!("Added SA {}", id);
        }
        Command::DelSa(args) => {
            let id = args.identifier()?;
            let mgr = StaticSaManager::new(connector).with_timeout(timeout);
            mgr.delete_sa(&id).await.context("DeleteSA failed")?;
            println!("Deleted SA {}", id);
        }
        Command::Stats => {
            let daemon = query_daemon(&connector, timeout)
                .await
                .context("Daemon query failed")?;
            let v = &daemon.version;
            println!(
                "{} {} ({} {} {})",
                v.daemon, v.version, v.sysname, v.release, v.machine
            );
            println!("{}", daemon.status);
        }
        Command::TunnelTest(args) => {
            let config = args.lifecycle_config(timeout).await?;
            let prober = PingProber::new(timeout.min(Duration::from_secs(10)));
            let orchestrator = TunnelOrchestrator::new(connector, prober, config);

            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, aborting in-flight call");
                    interrupt.cancel();
                }
            });

            match orchestrator.run_with_cancel(&cancel).await {
                Ok(report) => print_report(&report),
                Err(e) => {
                    print_report(&e.report);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

fn print_report(report: &LifecycleReport) {
    println!("connection {} child {}: {}", report.connection, report.child, report.state);
    let steps: Vec<&str> = report.completed.iter().map(|s| s.as_str()).collect();
    println!("  completed: {}", steps.join(", "));
    for ike in &report.ike_sas {
        println!(
            "  ike {} #{} {} {} <-> {}",
            ike.name, ike.uniqueid, ike.ikestate, ike.local_host, ike.remote_host
        );
        for child in &ike.childsas {
            println!(
                "    child {} {} {} in {} out {}",
                child.name, child.mode, child.state, child.spi_in, child.spi_out
            );
        }
    }
    if let Some(probe) = &report.probe {
        println!("  probe: {}", probe);
    }
    for warning in &report.warnings {
        println!("  warning: {}: {}", warning.step, warning.message);
    }
    for failure in &report.cleanup_failures {
        println!("  cleanup failed: {}: {}", failure.step, failure.message);
    }
}
