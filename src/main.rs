// Copyright 2024 The Prometheus Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::convert::Infallible;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use slog::{debug, error, info, o, Logger};
use tokio::net::TcpListener;

use nfsd_exporter::prometheus::collector::{gather, Collector};
use nfsd_exporter::prometheus::internal_fs::DEFAULT_PROC_MOUNT_POINT;
use nfsd_exporter::prometheus::nfsd_linux::NfsdCollector;
use nfsd_exporter::prometheus::promslog_flag::LogFlags;
use nfsd_exporter::prometheus::promslog_slog;
use nfsd_exporter::prometheus::text_create::{write_text, TEXT_CONTENT_TYPE};

#[derive(Debug, Parser)]
#[command(name = "nfsd_exporter", version, about = "Prometheus exporter for NFS server statistics")]
struct Cli {
    /// procfs mountpoint.
    #[arg(long = "path.procfs", env = "NFSD_EXPORTER_PROCFS", default_value = DEFAULT_PROC_MOUNT_POINT)]
    procfs: PathBuf,

    /// Address on which to expose metrics.
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:9100")]
    listen_address: SocketAddr,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// Scrape once, print the metrics to stdout and exit.
    #[arg(long)]
    once: bool,

    #[command(flatten)]
    log: LogFlags,
}

struct Exporter {
    collectors: Vec<Box<dyn Collector>>,
    telemetry_path: String,
    logger: Logger,
}

impl Exporter {
    /// Scrapes all collectors and renders the exposition. The second
    /// value is the number of collectors that failed.
    fn render(&self) -> io::Result<(Vec<u8>, usize)> {
        let scrape = gather(&self.collectors, &self.logger);
        let mut buf = Vec::new();
        write_text(&mut buf, &scrape.metrics)?;
        Ok((buf, scrape.failures))
    }

    async fn handle(self: Arc<Self>, req: Request<Incoming>) -> Response<String> {
        if req.uri().path() != self.telemetry_path {
            return plain_response(StatusCode::NOT_FOUND, "Not Found\n".to_string());
        }

        let exporter = self.clone();
        match tokio::task::spawn_blocking(move || exporter.render()).await {
            Ok(Ok((body, _))) => {
                let mut resp = Response::new(String::from_utf8_lossy(&body).into_owned());
                resp.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
                resp
            }
            Ok(Err(err)) => {
                error!(self.logger, "error encoding metrics"; "err" => %err);
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, format!("error encoding metrics: {}\n", err))
            }
            Err(err) => {
                error!(self.logger, "scrape task failed"; "err" => %err);
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, "scrape failed\n".to_string())
            }
        }
    }
}

fn plain_response(status: StatusCode, body: String) -> Response<String> {
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    resp
}

async fn serve(listener: TcpListener, exporter: Arc<Exporter>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                error!(exporter.logger, "failed to accept connection"; "err" => %err);
                continue;
            }
        };

        let exporter = exporter.clone();
        tokio::spawn(async move {
            let logger = exporter.logger.clone();
            let service = service_fn(move |req: Request<Incoming>| {
                let exporter = exporter.clone();
                async move { Ok::<_, Infallible>(exporter.handle(req).await) }
            });

            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(logger, "HTTP connection error"; "peer" => %peer, "err" => %err);
            }
        });
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = promslog_slog::new_logger(cli.log.level);

    let collector = match NfsdCollector::new(&cli.procfs, logger.new(o!("collector" => "nfsd"))) {
        Ok(collector) => collector,
        Err(err) => {
            error!(logger, "couldn't create nfsd collector"; "err" => %err);
            return ExitCode::FAILURE;
        }
    };

    let exporter = Arc::new(Exporter {
        collectors: vec![Box::new(collector)],
        telemetry_path: cli.telemetry_path,
        logger: logger.clone(),
    });

    if cli.once {
        return match exporter.render() {
            Ok((body, failures)) => {
                if let Err(err) = io::stdout().write_all(&body) {
                    error!(logger, "couldn't write metrics"; "err" => %err);
                    return ExitCode::FAILURE;
                }
                if failures > 0 {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(err) => {
                error!(logger, "error encoding metrics"; "err" => %err);
                ExitCode::FAILURE
            }
        };
    }

    let listener = match TcpListener::bind(cli.listen_address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(logger, "couldn't listen"; "address" => %cli.listen_address, "err" => %err);
            return ExitCode::FAILURE;
        }
    };

    info!(logger, "Starting nfsd_exporter";
        "version" => env!("CARGO_PKG_VERSION"),
        "address" => %cli.listen_address,
        "procfs" => %cli.procfs.display());

    tokio::select! {
        () = serve(listener, exporter) => {}
        _ = tokio::signal::ctrl_c() => {
            info!(logger, "Received shutdown signal");
        }
    }

    ExitCode::SUCCESS
}
