use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand};
use http::{HeaderName, HeaderValue, Method, Request};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::echo::EchoHandler;
use crate::middleware::{AccessLog, RequestIdMiddleware};

/// Command-line interface for brrtmux
#[derive(Parser)]
#[command(name = "brrtmux")]
#[command(about = "Inspect and probe brrtmux route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the route table built from a route file
    Routes {
        /// Route file (YAML)
        #[arg(short, long)]
        file: PathBuf,

        /// Dispatcher configuration file (YAML)
        #[arg(short, long, env = "BRRTMUX_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Dispatch one request through the route table and print the response
    Probe {
        /// Route file (YAML)
        #[arg(short, long)]
        file: PathBuf,

        /// Dispatcher configuration file (YAML)
        #[arg(short, long, env = "BRRTMUX_CONFIG")]
        config: Option<PathBuf>,

        /// Request header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// HTTP method
        method: String,

        /// Request path, optionally with a query string
        path: String,
    },
}

/// A route file: the routes to register, in order.
#[derive(Debug, Deserialize)]
pub struct RouteFile {
    pub routes: Vec<RouteEntry>,
}

/// One route in a [`RouteFile`].
#[derive(Debug, Deserialize)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    /// Handler name reported by the echo handler; defaults to `METHOD path`
    #[serde(default)]
    pub name: Option<String>,
}

impl RouteFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read route file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse route file {}", path.display()))
    }
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid http method `{method}`"))
}

/// Build a dispatcher serving every route in `routes` with the echo handler.
pub fn build_dispatcher(routes: &RouteFile, config: DispatcherConfig) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new(config);
    dispatcher.use_middleware(RequestIdMiddleware);
    dispatcher.use_middleware(AccessLog);
    dispatcher.use_health();
    for route in &routes.routes {
        let method = parse_method(&route.method)?;
        let name = route
            .name
            .clone()
            .unwrap_or_else(|| format!("{method} {}", route.path));
        dispatcher
            .try_add(method, &route.path, EchoHandler::new(name))
            .with_context(|| format!("failed to register {} {}", route.method, route.path))?;
    }
    Ok(dispatcher)
}

fn load_config(path: Option<&Path>) -> Result<DispatcherConfig> {
    match path {
        Some(path) => DispatcherConfig::load(path),
        None => DispatcherConfig::from_env(),
    }
}

fn build_request(method: &str, path: &str, headers: &[String], body: Option<&str>) -> Result<Request<Vec<u8>>> {
    let mut builder = Request::builder().method(parse_method(method)?).uri(path);
    for header in headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header `{header}` must look like `name: value`");
        };
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("invalid header name in `{header}`"))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid header value in `{header}`"))?;
        builder = builder.header(name, value);
    }
    builder
        .body(body.unwrap_or_default().as_bytes().to_vec())
        .with_context(|| format!("invalid request {method} {path}"))
}

/// Run `cli`, writing command output to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Commands::Routes { file, config } => {
            let routes = RouteFile::load(file)?;
            let dispatcher = build_dispatcher(&routes, load_config(config.as_deref())?)?;
            let table = dispatcher.router().routes();
            writeln!(out, "{} routes", table.len())?;
            for route in table {
                writeln!(out, "{:<8} {:<40} {}", route.method.as_str(), route.pattern, route.tree_path)?;
            }
            Ok(())
        }
        Commands::Probe {
            file,
            config,
            headers,
            body,
            method,
            path,
        } => {
            let routes = RouteFile::load(file)?;
            let dispatcher = build_dispatcher(&routes, load_config(config.as_deref())?)?;
            let request = build_request(method, path, headers, body.as_deref())?;
            let response = dispatcher.handle(request);
            writeln!(out, "{}", response.status())?;
            for (name, value) in response.headers() {
                writeln!(out, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            writeln!(out)?;
            out.write_all(response.body())?;
            writeln!(out)?;
            Ok(())
        }
    }
}

/// Parse the process arguments and run the selected command against stdout.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)
}
