//! sui-steps: run Sui operations over a list of JSON items.
//!
//! ```bash
//! # List the catalog
//! sui-steps operations --resource coin
//!
//! # One item from flags
//! sui-steps run account getBalance --param owner=0x2
//!
//! # Many items from a file, keeping going past failures
//! sui-steps run object get --items items.json --continue-on-fail
//!
//! # Follow events until Ctrl-C
//! sui-steps subscribe events --filter '{"MoveModule": {"package": "0x3", "module": "sui_system"}}'
//! ```
//!
//! Credentials come from `--credentials FILE` or the `SUI_*` environment
//! variables; records are printed to stdout as JSON, logs go to stderr.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sui_steps::{init_logging, schema_json, Credentials, ItemRunner, Session, Settings};
use sui_steps_transport::{SubscriptionClient, SubscriptionConfig, SubscriptionEvent};

#[derive(Parser)]
#[command(
    name = "sui-steps",
    author,
    version,
    about = "Sui JSON-RPC operations for workflow hosts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON credential file (network, rpcUrl, wsUrl, faucetUrl, privateKey, keyScheme)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List operations and their parameters
    Operations {
        /// Only this resource
        #[arg(long)]
        resource: Option<String>,
    },

    /// Run one operation for every item
    Run(RunCmd),

    /// Follow an event or transaction stream
    Subscribe {
        stream: Stream,

        /// Filter as JSON
        #[arg(long)]
        filter: String,
    },
}

#[derive(Parser)]
struct RunCmd {
    resource: String,
    operation: String,

    /// JSON file with an array of parameter objects (`-` for stdin)
    #[arg(long)]
    items: Option<String>,

    /// Parameter applied to every item; objects, arrays and true/false/null are JSON, the rest text
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Turn failing items into error records instead of stopping
    #[arg(long)]
    continue_on_fail: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Stream {
    Events,
    Transactions,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Operations { ref resource } => {
            print_json(&schema_json(resource.as_deref()), cli.pretty)
        }
        Commands::Run(ref cmd) => run(&cli, cmd).await,
        Commands::Subscribe { stream, ref filter } => subscribe(&cli, stream, filter).await,
    }
}

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn load_credentials(cli: &Cli) -> Result<Credentials> {
    match &cli.credentials {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading credentials from {}", path.display()))?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing credentials in {}", path.display()))?;
            Ok(Credentials::from_json(&value)?)
        }
        None => Ok(Credentials::from_env()?),
    }
}

/// `key=value`. Objects, arrays and the literals `true`, `false` and `null`
/// are read as JSON; anything else stays text so amounts and cursors keep
/// every digit.
fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("parameter '{raw}' is not KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("parameter '{raw}' has an empty key");
    }
    let trimmed = value.trim();
    let structured = trimmed.starts_with('{')
        || trimmed.starts_with('[')
        || matches!(trimmed, "true" | "false" | "null");
    let value = if structured {
        serde_json::from_str(trimmed)
            .with_context(|| format!("parameter '{key}' is not valid JSON"))?
    } else {
        Value::String(value.to_string())
    };
    Ok((key.to_string(), value))
}

fn read_items(source: Option<&str>) -> Result<Vec<Value>> {
    let Some(source) = source else {
        return Ok(vec![Value::Object(Map::new())]);
    };
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading items from {source}"))?
    };
    match serde_json::from_str(&text).context("items must be JSON")? {
        Value::Array(items) => Ok(items),
        item @ Value::Object(_) => Ok(vec![item]),
        other => bail!("items must be an object or an array of objects, got {other}"),
    }
}

async fn run(cli: &Cli, cmd: &RunCmd) -> Result<()> {
    let overrides = cmd
        .params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<Vec<_>>>()?;
    let mut items = read_items(cmd.items.as_deref())?;
    for item in &mut items {
        let Value::Object(map) = item else {
            bail!("every item must be a JSON object, got {item}");
        };
        for (key, value) in &overrides {
            map.insert(key.clone(), value.clone());
        }
    }

    let session = Session::init(&load_credentials(cli)?, Settings::from_env())?;
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let runner = ItemRunner::new(&session)
        .continue_on_fail(cmd.continue_on_fail)
        .with_cancel(cancel);
    match runner.run(&cmd.resource, &cmd.operation, items).await {
        Ok(records) => {
            let out: Vec<Value> = records.iter().map(|r| r.to_json()).collect();
            print_json(&Value::Array(out), cli.pretty)
        }
        Err(err) => {
            print_json(&err.to_json(), cli.pretty)?;
            Err(anyhow!(err))
        }
    }
}

async fn subscribe(cli: &Cli, stream: Stream, filter: &str) -> Result<()> {
    let filter: Value = serde_json::from_str(filter).context("--filter must be JSON")?;
    let credentials = load_credentials(cli)?;
    let endpoints = credentials.endpoints()?;
    let settings = Settings::from_env();
    let config = SubscriptionConfig::new(&endpoints.ws_url)
        .with_subscribe_timeout(settings.subscribe_timeout)
        .with_reconnect(settings.reconnect);

    let cancel = CancellationToken::new();
    let (client, mut events) = SubscriptionClient::connect_with_cancel(config, cancel.clone()).await?;
    let subscription = match stream {
        Stream::Events => client.subscribe_event(filter).await?,
        Stream::Transactions => client.subscribe_transaction(filter).await?,
    };
    info!(%subscription, network = %endpoints.network, "subscribed");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                client.unsubscribe();
                client.close();
                break;
            }
            event = events.recv() => match event {
                Some(SubscriptionEvent::Notification { result, .. }) => print_json(&result, cli.pretty)?,
                Some(SubscriptionEvent::Reconnecting { attempt, delay }) => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "subscription dropped; reconnecting");
                }
                Some(SubscriptionEvent::Reconnected { attempt }) => info!(attempt, "subscription restored"),
                Some(SubscriptionEvent::Failed(err)) => return Err(anyhow!(err)),
                None => break,
            },
        }
    }
    client.closed().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("limit=5").unwrap(), ("limit".into(), json!("5")));
        assert_eq!(parse_param("owner=0x2").unwrap(), ("owner".into(), json!("0x2")));
        assert_eq!(
            parse_param("filter={\"Sender\":\"0x1\"}").unwrap().1,
            json!({"Sender": "0x1"})
        );
        assert_eq!(parse_param("sources=[\"0x5\"]").unwrap().1, json!(["0x5"]));
        assert_eq!(parse_param("descending=true").unwrap().1, json!(true));
        assert_eq!(parse_param("cursor=null").unwrap().1, Value::Null);
        assert_eq!(parse_param("note=a=b").unwrap().1, json!("a=b"));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
        assert!(parse_param("filter={oops").is_err());
    }

    #[test]
    fn test_parse_param_keeps_numbers_as_text() {
        assert_eq!(parse_param("amount=0.000000001").unwrap().1, json!("0.000000001"));
        assert_eq!(
            parse_param("amount=123456789012345678901234567890").unwrap().1,
            json!("123456789012345678901234567890")
        );
        assert_eq!(parse_param("cursor=12345").unwrap().1, json!("12345"));
    }
}
