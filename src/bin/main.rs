//! atm CLI - drive one wallet/contract session from the terminal
//!
//! Every command prints the session view as JSON:
//!   atm status                   → detect the wallet, adopt an authorized account
//!   atm connect                  → request accounts and bind the contract
//!   atm balance                  → connect, then read getBalance()
//!   atm deposit [--amount N]     → connect, then deposit (default 100)
//!   atm withdraw [--amount N]    → connect, then withdraw (default 60)
//!
//! Long-running:
//!   atm repl                     → one session, commands on stdin
//!   atm serve --port 8080        → HTTP surface over one session
//!
//! Provider:
//!   --rpc <url>    JSON-RPC endpoint (env: ATM_RPC_URL, default http://127.0.0.1:8545)
//!   --dev          in-memory chain with the ATM contract deployed

use anyhow::{anyhow, bail, Context};
use atm_session::logging::{init_logging, LogFormat};
use atm_session::provider::{DevChain, HttpProvider, Provider, StaticHost};
use atm_session::core::parse_address;
use atm_session::{AtmConfig, OperationOutcome, SessionController, Units};
use serde_json::{json, Value};
use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use tracing::{debug, info};

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging(LogFormat::from_env(opts.log_json));

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("atm {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("status") => cmd_status(&opts),
        Some("connect") => cmd_connect(&opts),
        Some("balance") => cmd_balance(&opts),
        Some("deposit") => cmd_deposit(&opts),
        Some("withdraw") => cmd_withdraw(&opts),
        Some("repl") => cmd_repl(&opts),
        Some("serve") => cmd_serve(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && (opts.pretty || io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let out = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    out.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    // Provider options
    dev: bool,
    rpc_url: Option<String>,
    contract: Option<String>,
    abi_path: Option<String>,
    // Operation options
    amount: Option<String>,
    // Server options
    port: Option<u16>,
    // Output options
    json: bool,
    pretty: bool,
    log_json: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        // Load .env file if present
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    if !value.is_empty() && env::var(key.trim()).is_err() {
                        env::set_var(key.trim(), value);
                    }
                }
            }
        }

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let next = args.get(i + 1).cloned();
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--log-json" => opts.log_json = true,
                "--dev" => opts.dev = true,
                "--rpc" | "-r" if next.is_some() => { opts.rpc_url = next; i += 1; }
                "--contract" | "-c" if next.is_some() => { opts.contract = next; i += 1; }
                "--abi" if next.is_some() => { opts.abi_path = next; i += 1; }
                "--amount" | "-a" if next.is_some() => { opts.amount = next; i += 1; }
                "--port" | "-p" if next.is_some() => {
                    opts.port = next.and_then(|p| p.parse().ok());
                    i += 1;
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        if opts.amount.is_none() {
            opts.amount = positional.first().cloned();
        }
        if opts.port.is_none() {
            opts.port = env::var("ATM_PORT").ok().and_then(|p| p.parse().ok());
        }
        opts
    }
}

fn print_usage() {
    println!(
        r#"atm - wallet/contract ATM session

USAGE:
    atm <command> [options]

COMMANDS:
    status                  Detect wallet and show the session
    connect                 Connect the wallet and bind the contract
    balance                 Connect and read the contract balance
    deposit [amount]        Connect and deposit (default 100)
    withdraw [amount]       Connect and withdraw (default 60)
    repl                    Interactive session
    serve                   Start HTTP server

PROVIDER OPTIONS:
    --dev                   In-memory dev chain (ATM contract pre-deployed)
    --rpc, -r <url>         JSON-RPC endpoint (env: ATM_RPC_URL)
    --contract, -c <addr>   Contract address (env: ATM_CONTRACT_ADDRESS)
    --abi <path>            ABI or artifact JSON (env: ATM_ABI_PATH)
    --amount, -a <n>        Amount for deposit/withdraw

SERVER OPTIONS:
    --port, -p <port>       Server port (default: 8080, env: ATM_PORT)

OUTPUT OPTIONS:
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --log-json              JSON log lines on stderr
    --version, -V           Print version

ENVIRONMENT:
    ATM_DEPOSIT_AMOUNT / ATM_WITHDRAW_AMOUNT    Fixed amounts
    ATM_POLL_INTERVAL_MS / ATM_CONFIRM_TIMEOUT_MS  Receipt polling
    ATM_LOG_JSON=1          Same as --log-json
    RUST_LOG                Log filter (default: warn,atm_session=info,atm=info,tower_http=info)

EXAMPLES:
    atm deposit --dev
    atm withdraw --rpc http://127.0.0.1:8545 --amount 10
    atm serve --dev --port 3000
    atm balance --json | jq .balance
"#
    );
}

fn load_config(opts: &ParsedArgs) -> anyhow::Result<AtmConfig> {
    let mut config = AtmConfig::from_env().context("loading ATM_* configuration")?;
    if let Some(addr) = opts.contract.as_deref() {
        config = config.with_contract(parse_address(addr).context("--contract")?);
    }
    if let Some(path) = opts.abi_path.as_deref() {
        config = config.with_abi_file(path)?;
    }
    if let Some(url) = opts.rpc_url.as_deref() {
        config = config.with_rpc_url(url);
    }
    Ok(config)
}

fn build_controller(opts: &ParsedArgs) -> anyhow::Result<SessionController> {
    let config = load_config(opts)?;
    let provider: Arc<dyn Provider> = if opts.dev {
        info!(contract = %config.contract_address, "using in-memory dev chain");
        Arc::new(DevChain::new().with_contract(config.contract_address))
    } else {
        info!(url = %config.rpc_url, "using JSON-RPC provider");
        Arc::new(HttpProvider::new(config.rpc_url.clone())?)
    };
    Ok(SessionController::new(Arc::new(StaticHost::new(provider)), config))
}

fn amount(opts: &ParsedArgs, default: Units) -> anyhow::Result<Units> {
    match opts.amount.as_deref() {
        Some(raw) => Ok(atm_session::config::parse_units("--amount", raw)?),
        None => Ok(default),
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create runtime")
}

fn view_json(controller: &SessionController) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(controller.view())?)
}

fn with_outcome(controller: &SessionController, outcome: &OperationOutcome) -> anyhow::Result<Value> {
    let mut view = view_json(controller)?;
    view["outcome"] = json!(outcome.as_str());
    if let OperationOutcome::Succeeded(receipt) = outcome {
        view["transaction_hash"] = json!(receipt.transaction_hash.to_string());
    }
    Ok(view)
}

fn cmd_status(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let controller = build_controller(opts)?;
    runtime()?.block_on(controller.init());
    view_json(&controller)
}

fn cmd_connect(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let controller = build_controller(opts)?;
    runtime()?.block_on(controller.connect());
    view_json(&controller)
}

fn cmd_balance(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let controller = build_controller(opts)?;
    runtime()?.block_on(async {
        controller.connect().await;
        controller.refresh_balance().await;
    });
    view_json(&controller)
}

fn cmd_deposit(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let controller = build_controller(opts)?;
    let amount = amount(opts, controller.config().deposit_amount)?;
    let outcome = runtime()?.block_on(async {
        controller.connect().await;
        controller.deposit_amount(amount).await
    });
    with_outcome(&controller, &outcome)
}

fn cmd_withdraw(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let controller = build_controller(opts)?;
    let amount = amount(opts, controller.config().withdraw_amount)?;
    let outcome = runtime()?.block_on(async {
        controller.connect().await;
        controller.withdraw_amount(amount).await
    });
    with_outcome(&controller, &outcome)
}

fn cmd_repl(opts: &ParsedArgs) -> anyhow::Result<Value> {
    println!("atm REPL - type 'help' or 'quit'\n");

    let controller = build_controller(opts)?;
    let rt = runtime()?;
    rt.block_on(controller.init());

    loop {
        print!("atm> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        if input.is_empty() {
            break; // EOF
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let parsed_amount = |default: Units| -> Result<Units, String> {
            match parts.get(1) {
                Some(raw) => atm_session::config::parse_units("amount", raw).map_err(|e| e.to_string()),
                None => Ok(default),
            }
        };

        match parts.first().copied() {
            Some("quit") | Some("exit") | Some("q") => break,
            Some("help") | Some("?") => {
                println!("Commands:");
                println!("  status            - Show session view");
                println!("  connect           - Connect wallet");
                println!("  balance           - Refresh balance");
                println!("  deposit [n]       - Deposit (default {})", controller.config().deposit_amount);
                println!("  withdraw [n]      - Withdraw (default {})", controller.config().withdraw_amount);
                println!("  log               - Show notifications");
                println!("  dismiss           - Dismiss the alert");
                println!("  quit              - Exit");
            }
            Some("status") => println!("{}", render(&view_json(&controller)?, true)),
            Some("connect") => {
                let state = rt.block_on(controller.connect());
                println!("{}", state.as_str());
                if let Some(alert) = controller.snapshot().alert() {
                    println!("! {}", alert);
                }
            }
            Some("balance") => match rt.block_on(controller.refresh_balance()) {
                Some(balance) => println!("{}", balance),
                None => println!("No contract bound. Type 'connect'."),
            },
            Some(cmd @ ("deposit" | "withdraw")) => {
                let default = if cmd == "deposit" { controller.config().deposit_amount } else { controller.config().withdraw_amount };
                match parsed_amount(default) {
                    Ok(n) => {
                        let outcome = if cmd == "deposit" {
                            rt.block_on(controller.deposit_amount(n))
                        } else {
                            rt.block_on(controller.withdraw_amount(n))
                        };
                        debug!(outcome = outcome.as_str(), "repl operation finished");
                        if let Some(last) = controller.notifications().last() {
                            println!("{}", last);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            Some("log") => {
                for (i, n) in controller.notifications().iter().enumerate() {
                    println!("{:>3}. {}", i + 1, n);
                }
            }
            Some("dismiss") => match controller.dismiss_alert() {
                Some(alert) => println!("Dismissed: {}", alert),
                None => println!("No alert"),
            },
            Some(cmd) => println!("Unknown: {}. Type 'help'.", cmd),
            None => {}
        }
    }

    println!("Goodbye!");
    Ok(json!({"status": "exited", "notifications": controller.notifications()}))
}

fn cmd_serve(opts: &ParsedArgs) -> anyhow::Result<Value> {
    use atm_session::install_signal_handlers;
    use atm_session::server::create_router_with_name;

    let port = opts.port.unwrap_or(8080);
    let controller = Arc::new(build_controller(opts)?);

    let rt = runtime()?;
    rt.block_on(async {
        let shutdown = install_signal_handlers();

        controller.init().await;
        info!(state = controller.state().as_str(), "session initialized");

        let router = create_router_with_name(controller.clone(), "atm");
        let addr = format!("0.0.0.0:{}", port);

        info!("atm server listening on http://{}", addr);
        info!("Endpoints:");
        info!("  GET  /health              - Health check");
        info!("  GET  /session             - Session view");
        debug!("  POST /session/connect     - Connect wallet");
        debug!("  POST /session/deposit     - Deposit {{\"amount\": n}}");
        debug!("  POST /session/withdraw    - Withdraw {{\"amount\": n}}");

        let listener = tokio::net::TcpListener::bind(&addr).await
            .with_context(|| format!("Failed to bind {}", addr))?;

        let mut shutdown_rx = shutdown.subscribe();
        tokio::select! {
            result = axum::serve(listener, router) => {
                result.context("Server error")?;
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping server...");
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;

    if controller.is_busy() {
        bail!("stopped with a transaction still in flight");
    }
    Ok(json!({"status": "stopped", "notifications": controller.notifications()}))
}
