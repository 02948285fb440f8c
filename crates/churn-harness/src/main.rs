use churn_common::{Config, TransportKind};
use churn_harness::engine::driver::{StressDriver, StressSettings};
use churn_harness::metrics::StressMetrics;
use churn_harness::transport::TcpConnector;
use churn_harness::StressError;
use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use std::convert::Infallible;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_CONFIG_PATH: &str = "config/churnguard.yaml";

fn init_production_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_target(true))
        .init();

    info!("Production structured logging initialized (JSON)");
}

fn load_config() -> Result<Config, StressError> {
    let path = std::env::var_os("CHURN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let data = fs::read_to_string(&path).map_err(|source| StressError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    Ok(Config::from_yaml(&data)?)
}

fn metrics_handler(metrics: &StressMetrics, req: Request<Body>) -> Response<Body> {
    match req.uri().path() {
        "/health" => Response::new(Body::from("OK")),
        "/metrics" => Response::new(Body::from(metrics.render())),
        _ => {
            let mut not_found = Response::new(Body::from("Not Found"));
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            not_found
        }
    }
}

async fn run_metrics_server(port: u16, metrics: Arc<StressMetrics>, shutdown: CancellationToken) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let make_svc = make_service_fn(move |_conn| {
        let metrics = Arc::clone(&metrics);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let response = metrics_handler(&metrics, req);
                async move { Ok::<_, Infallible>(response) }
            }))
        }
    });

    let server = match Server::try_bind(&addr) {
        Ok(builder) => builder.serve(make_svc),
        Err(e) => {
            error!(port = port, error = %e, "Observability server failed to bind");
            return;
        }
    };

    info!(port = port, "Observability server online");

    if let Err(e) = server
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        error!(error = %e, "Observability server failed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_production_logging();

    let config = load_config()?;
    let settings = StressSettings::try_from(&config)?;
    let connector = match config.transport.kind {
        TransportKind::Tcp => Arc::new(TcpConnector::from(&config.transport)),
    };

    let driver = StressDriver::new(settings, connector);
    let master_token = CancellationToken::new();

    if config.metrics.enabled {
        let port = config.metrics.port;
        let metrics = driver.metrics();
        let shutdown = master_token.child_token();
        tokio::spawn(async move {
            run_metrics_server(port, metrics, shutdown).await;
        });
    }

    let run_token = master_token.child_token();
    let deadline = config.stress.run_duration_secs.map(Duration::from_secs);
    tokio::spawn(async move {
        let expired = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
            _ = expired => info!("Run duration elapsed"),
        }
        master_token.cancel();
    });

    let result = driver.run(run_token).await;
    match result {
        Ok(report) => {
            info!(
                attempts = report.total_attempts,
                elapsed = ?report.elapsed,
                "Stress run finished without fatal failures"
            );
            println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
            Ok(())
        }
        Err(e) => {
            if let Some(report) = e.report() {
                println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
            }
            error!(error = %e, "Stress run failed");
            Err(e.into())
        }
    }
}
