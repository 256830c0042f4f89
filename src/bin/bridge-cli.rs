use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use rest_rpc_bridge::config::{load_config, MethodConfig};
use rest_rpc_bridge::registry::MethodDescriptor;
use rest_rpc_bridge::rest::MemoryRequest;
use rest_rpc_bridge::ArgumentBinder;

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Inspect and exercise a REST-to-RPC bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print its routes
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Bind a request offline and print the arguments it produces
    Bind {
        #[arg(short, long)]
        config: PathBuf,

        /// Method to bind, as `Service.Method` or just `Method`
        method: String,

        /// Path parameter, `name=value`
        #[arg(long = "path", value_parser = parse_pair)]
        path: Vec<(String, String)>,

        /// Query parameter, `name=value`; repeat for multiple values
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Header, `name=value`
        #[arg(long = "header", value_parser = parse_pair)]
        header: Vec<(String, String)>,

        /// JSON body
        #[arg(long)]
        body: Option<String>,
    },
    /// Send a request to a running bridge
    Call {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request path including any query string
        path: String,

        /// Header, `name=value`
        #[arg(long = "header", value_parser = parse_pair)]
        header: Vec<(String, String)>,

        /// JSON body
        #[arg(long)]
        body: Option<String>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{}`", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let mut routes = Vec::new();
            for service in &config.services {
                for method in service.method_configs() {
                    routes.push(json!({
                        "http_method": method.http_method()?.as_str(),
                        "path": method.path,
                        "target": format!("{}.{}", method.interface_name, method.method_name),
                        "signature": method.signature,
                    }));
                }
            }
            println!("{}", serde_json::to_string_pretty(&json!({ "routes": routes }))?);
        }
        Commands::Bind {
            config,
            method,
            path,
            query,
            header,
            body,
        } => {
            let config = load_config(&config)?;
            let target = find_method(&config.services, &method)
                .ok_or_else(|| format!("no method `{}` in config", method))?;
            let descriptor = MethodDescriptor::from_config(&target)?
                .ok_or_else(|| format!("method `{}` declares no signature", method))?;

            let mut request = MemoryRequest::new();
            for (k, v) in path {
                request = request.with_path(k, v);
            }
            for (k, v) in query {
                request = request.with_query(k, v);
            }
            for (k, v) in header {
                request = request.with_header(&k, v);
            }
            if let Some(body) = body {
                let value: Value = serde_json::from_str(&body)?;
                request = request.with_json(&value);
            }

            let binding = ArgumentBinder::new(&target, &descriptor).bind(&request);
            println!("{}", serde_json::to_string_pretty(&binding)?);
        }
        Commands::Call {
            url,
            method,
            path,
            header,
            body,
        } => {
            let client = reqwest::Client::new();
            let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let mut req = client.request(method, format!("{}{}", url.trim_end_matches('/'), path));
            for (k, v) in header {
                req = req.header(k, v);
            }
            if let Some(body) = body {
                let value: Value = serde_json::from_str(&body)?;
                req = req.json(&value);
            }
            print_response(req.send().await?).await?;
        }
    }

    Ok(())
}

fn find_method(
    services: &[rest_rpc_bridge::ServiceConfig],
    name: &str,
) -> Option<MethodConfig> {
    let (service, method) = match name.split_once('.') {
        Some((s, m)) => (Some(s), m),
        None => (None, name),
    };
    services
        .iter()
        .filter(|s| service.map_or(true, |name| s.interface_name == name))
        .flat_map(|s| s.method_configs())
        .find(|m| m.method_name == method)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: bridge returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
