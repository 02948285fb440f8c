use churn_harness::transport::TcpConnector;
use churn_harness::{run_stress_test, StressSettings};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One worker with a short pause between attempts, against a local listener
/// that accepts and drops every connection. Slow enough to stay clear of
/// ephemeral port exhaustion.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let target = listener.local_addr()?;
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            if stream.is_err() {
                break;
            }
        }
    });

    let mut settings = StressSettings::new(1, target);
    settings.pacing = Some(Duration::from_millis(2));
    settings.max_iterations = Some(5_000);

    let report = run_stress_test(
        settings,
        Arc::new(TcpConnector::new()),
        CancellationToken::new(),
    )
    .await?;

    println!("{}", report.snapshot);
    let snap = &report.snapshot;
    if snap.bind_failures.count > 0 || snap.failed_closes > 0 {
        eprintln!("Leak suspected: bind failures or failed closes observed");
    }
    Ok(())
}
