use churn_harness::transport::TcpConnector;
use churn_harness::{run_stress_test, StressSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Nothing should listen here: every attempt ends in "connection refused".
    let target: SocketAddr = "127.0.0.1:6666".parse()?;
    let workers = 10;
    let run_for = Duration::from_secs(30);

    println!(
        "Starting churn: {} workers against {} for {:?}",
        workers, target, run_for
    );

    let mut settings = StressSettings::new(workers, target);
    settings.report_interval = Some(Duration::from_secs(10));

    let cancel = CancellationToken::new();
    let timer = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(run_for).await;
        timer.cancel();
    });

    let report = run_stress_test(settings, Arc::new(TcpConnector::new()), cancel).await?;

    println!("{}", report.snapshot);
    println!("Attempts: {}", report.total_attempts);
    Ok(())
}
