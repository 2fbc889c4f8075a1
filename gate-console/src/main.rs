// ABOUTME: Interactive console for an operator-filtered NFT registry.
// ABOUTME: Reads .gate.json, deploys it, and runs commands as any account.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use opfilter::prelude::*;

const HELP: &str = "\
Commands:
  whoami                              show the acting account
  as <account>                        act as another account
  mint <to> <id>                      mint a token (registry owner)
  burn <id>                           burn a token
  transfer <from> <to> <id>           transfer as the acting account
  relay <proxy> <from> <to> <id>      transfer through a relay
  approve <to> <id>                   approve one token
  approve-all <operator> <on|off>     approve an operator for all tokens
  install <policy|none>               install the operator filter (registry owner)
  block <policy> <account> <on|off>   toggle a blacklist entry (policy admin)
  allow <policy> <account> <on|off>   toggle an allowlist entry (policy admin)
  check <operator> <holder>           dry-run the operator filter
  owner <id>                          show a token's owner
  balance <account>                   show an account's balance
  filter                              show the installed filter
  policies                            list deployed policies
  help                                show this help
  quit                                exit";

fn find_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("GATE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // Try .gate.json in current directory
    let local = PathBuf::from(".gate.json");
    if local.exists() {
        return Some(local);
    }

    // Try ~/.gate.json
    if let Some(home) = dirs::home_dir() {
        let global = home.join(".gate.json");
        if global.exists() {
            return Some(global);
        }
    }

    None
}

fn load_config() -> Result<GateConfig> {
    let Some(path) = find_config() else {
        println!("No .gate.json found, using the demo deployment.");
        return Ok(GateConfig::demo());
    };

    let config = GateConfig::load(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    println!("Loaded {}", path.display());
    Ok(config)
}

/// Prints every event using the deployment's names.
struct PrintObserver {
    names: HashMap<Address, String>,
}

impl PrintObserver {
    fn new(deployment: &Deployment) -> Self {
        let mut names = HashMap::new();
        for (name, address) in &deployment.accounts {
            names.insert(*address, name.clone());
        }
        for (name, policy) in &deployment.policies {
            names.insert(policy.address(), name.clone());
        }
        for (name, proxy) in &deployment.proxies {
            names.insert(proxy.address(), name.clone());
        }
        names.insert(deployment.registry.address(), "registry".to_string());
        Self { names }
    }

    fn name(&self, address: &Address) -> String {
        if address.is_zero() {
            return "nobody".to_string();
        }
        self.names
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.to_string())
    }

    fn maybe(&self, address: &Option<Address>) -> String {
        address
            .as_ref()
            .map(|a| self.name(a))
            .unwrap_or_else(|| "none".to_string())
    }
}

#[async_trait]
impl Observer for PrintObserver {
    async fn on_event(&self, event: &GateEvent) -> Result<(), anyhow::Error> {
        let line = match event {
            GateEvent::OperatorFilterChanged {
                previous, current, ..
            } => format!(
                "filter {} -> {}",
                self.maybe(previous),
                self.maybe(current)
            ),
            GateEvent::OwnershipTransferred {
                previous, current, ..
            } => format!(
                "ownership {} -> {}",
                self.maybe(previous),
                self.maybe(current)
            ),
            GateEvent::Transfer {
                from, to, token_id, ..
            } => format!(
                "token #{} {} -> {}",
                token_id,
                self.name(from),
                self.name(to)
            ),
            GateEvent::Approval {
                owner,
                approved,
                token_id,
                ..
            } => format!(
                "{} approved {} for token #{}",
                self.name(owner),
                self.name(approved),
                token_id
            ),
            GateEvent::ApprovalForAll {
                owner,
                operator,
                approved,
                ..
            } => format!(
                "{} {} {} for all tokens",
                self.name(owner),
                if *approved { "approved" } else { "revoked" },
                self.name(operator)
            ),
            GateEvent::OperatorRejected {
                policy,
                operator,
                token_owner,
                ..
            } => format!(
                "{} refused {} acting for {}",
                self.name(policy),
                self.name(operator),
                self.name(token_owner)
            ),
            GateEvent::OperatorBlockChanged {
                policy,
                operator,
                blocked,
            } => format!(
                "{} {} {}",
                self.name(policy),
                if *blocked { "blocked" } else { "unblocked" },
                self.name(operator)
            ),
            GateEvent::OperatorAllowChanged {
                policy,
                operator,
                allowed,
            } => format!(
                "{} {} {}",
                self.name(policy),
                if *allowed { "allowed" } else { "disallowed" },
                self.name(operator)
            ),
            GateEvent::PolicyAdminChanged {
                policy, current, ..
            } => format!("{} admin -> {}", self.name(policy), self.maybe(current)),
        };
        println!("  [{}] {}", event.kind(), line);
        Ok(())
    }
}

struct Console {
    deployment: Deployment,
    caller: Address,
}

fn parse_flag(arg: &str) -> Result<bool> {
    match arg {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => bail!("expected on/off, got '{}'", other),
    }
}

fn parse_id(arg: &str) -> Result<u64> {
    arg.parse()
        .with_context(|| format!("token id must be a number, got '{}'", arg))
}

impl Console {
    fn resolve(&self, arg: &str) -> Result<Address> {
        self.deployment
            .resolve(arg)
            .ok_or_else(|| anyhow!("unknown account '{}'", arg))
    }

    fn policy(&self, name: &str) -> Result<&DeployedPolicy> {
        self.deployment
            .policies
            .get(name)
            .ok_or_else(|| anyhow!("unknown policy '{}'", name))
    }

    fn name(&self, address: &Address) -> String {
        self.deployment.name_of(address)
    }

    /// Run one command line. Returns false when the console should exit.
    async fn execute(&mut self, line: &str) -> Result<bool> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let registry = self.deployment.registry.clone();

        match args.as_slice() {
            ["quit"] | ["exit"] => return Ok(false),
            ["help"] => println!("{}", HELP),
            ["whoami"] => println!("{} ({})", self.name(&self.caller), self.caller),
            ["as", account] => {
                self.caller = self.resolve(account)?;
                println!("Acting as {}", self.name(&self.caller));
            }
            ["mint", to, id] => {
                registry
                    .mint(&self.caller, self.resolve(to)?, parse_id(id)?)
                    .await?;
            }
            ["burn", id] => {
                registry.burn(&self.caller, parse_id(id)?).await?;
            }
            ["transfer", from, to, id] => {
                registry
                    .transfer_from(
                        &self.caller,
                        self.resolve(from)?,
                        self.resolve(to)?,
                        parse_id(id)?,
                    )
                    .await?;
            }
            ["relay", proxy, from, to, id] => {
                let proxy = match self.deployment.proxies.get(*proxy) {
                    Some(proxy) => *proxy,
                    None => TransferProxy::at(self.resolve(proxy)?),
                };
                proxy
                    .transfer_from(
                        &registry,
                        self.resolve(from)?,
                        self.resolve(to)?,
                        parse_id(id)?,
                    )
                    .await?;
            }
            ["approve", to, id] => {
                registry
                    .approve(&self.caller, self.resolve(to)?, parse_id(id)?)
                    .await?;
            }
            ["approve-all", operator, flag] => {
                registry
                    .set_approval_for_all(&self.caller, self.resolve(operator)?, parse_flag(flag)?)
                    .await?;
            }
            ["install", "none"] => {
                registry.set_operator_filter(&self.caller, None).await?;
            }
            ["install", policy] => {
                let address = self.resolve(policy)?;
                registry
                    .set_operator_filter(&self.caller, Some(address))
                    .await?;
            }
            ["block", policy, account, flag] | ["allow", policy, account, flag] => {
                let deployed = self.policy(policy)?;
                let expected = if args[0] == "block" {
                    "blacklist"
                } else {
                    "allowlist"
                };
                if deployed.kind() != expected {
                    bail!("'{}' is a {}, not a {}", policy, deployed.kind(), expected);
                }
                deployed
                    .set_listed(&self.caller, self.resolve(account)?, parse_flag(flag)?)
                    .await?;
            }
            ["check", operator, holder] => {
                let decision = registry
                    .check_authorized(&self.resolve(operator)?, &self.resolve(holder)?)
                    .await?;
                println!("permitted: {:?}", decision);
            }
            ["owner", id] => {
                let owner = registry.owner_of(parse_id(id)?).await?;
                println!("{}", self.name(&owner));
            }
            ["balance", account] => {
                let account = self.resolve(account)?;
                println!("{}", registry.balance_of(&account).await);
            }
            ["filter"] => match registry.operator_filter().await {
                Some(policy) => println!("{} ({})", self.name(&policy), policy),
                None => println!("none"),
            },
            ["policies"] => {
                let installed = registry.operator_filter().await;
                for (name, policy) in &self.deployment.policies {
                    let marker = if installed == Some(policy.address()) {
                        "*"
                    } else {
                        " "
                    };
                    let listed: Vec<String> = policy
                        .listed()
                        .await
                        .iter()
                        .map(|a| self.name(a))
                        .collect();
                    println!(
                        "{} {} [{}] {} listed: {}",
                        marker,
                        name,
                        policy.kind(),
                        policy.address(),
                        if listed.is_empty() {
                            "-".to_string()
                        } else {
                            listed.join(", ")
                        }
                    );
                }
            }
            _ => bail!("unknown command, type 'help'"),
        }

        Ok(true)
    }
}

async fn run_console(console: &mut Console) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("Type 'help' for commands, 'quit' to exit.\n");

    loop {
        let prompt = format!("{}> ", console.name(&console.caller));
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => break,
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);
        tracing::debug!(command = line, "executing");

        match console.execute(line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("Error: {:#}", e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opfilter=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let deployment = config.deploy().await?;
    deployment
        .events
        .subscribe(PrintObserver::new(&deployment))
        .await;

    println!(
        "Registry {} owned by {}",
        deployment.registry.address(),
        deployment.name_of(&config.owner)
    );
    let mut console = Console {
        caller: config.owner,
        deployment,
    };

    run_console(&mut console).await
}
