//! Command line surface
//!
//! Parses flags with clap, layers them over the config file and environment,
//! and hands each subcommand to the batch executor.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::api::request::{StopType, TimeoutAction};
use crate::api::{ApiClient, CloudService};
use crate::commands;
use crate::commands::network::{DeleteNetwork, ModifyNetwork};
use crate::commands::router::{DeleteRouter, ModifyRouter};
use crate::commands::server::{
    DeleteServer, EjectCdrom, LoadCdrom, RestartServer, StartServer, StopServer,
};
use crate::commands::storage::{DeleteStorage, ModifyStorage};
use crate::config::Config;
use crate::error::{BatchError, CliError};
use crate::executor::{BatchCommand, BatchExecutor, ExecutionOptions, TerminalConfirm, WaitOptions};
use crate::livelog::LiveLog;
use crate::output::{render_outcome, render_records, OutputFormat};
use crate::resolver::{ResolverRegistry, ResourceKind};
use crate::waiter::{CancelHandle, CancelSignal};

/// Command line client for UpCloud
#[derive(Parser, Debug)]
#[command(name = "upctl", version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to upctl.yaml in the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    pub log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// Wait until each resource reaches its resulting state
    #[arg(long, global = true)]
    pub wait: bool,

    /// Do not ask for confirmation on large batches
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Concurrent actions for non-destructive commands
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// How long --wait waits for a state, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub client_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage servers
    #[command(subcommand)]
    Server(ServerCommand),
    /// Manage storages
    #[command(subcommand)]
    Storage(StorageCommand),
    /// Manage networks
    #[command(subcommand)]
    Network(NetworkCommand),
    /// Manage routers
    #[command(subcommand)]
    Router(RouterCommand),
}

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Start servers
    Start {
        #[arg(value_name = "UUID/Title...")]
        servers: Vec<String>,
    },
    /// Stop servers
    Stop {
        #[arg(long = "type", value_enum, default_value_t = StopType::Soft)]
        stop_type: StopType,
        #[arg(value_name = "UUID/Title...")]
        servers: Vec<String>,
    },
    /// Restart servers
    Restart {
        #[arg(long = "type", value_enum, default_value_t = StopType::Soft)]
        stop_type: StopType,
        /// Action when a soft stop times out
        #[arg(long, value_enum, default_value_t = TimeoutAction::Ignore)]
        timeout_action: TimeoutAction,
        #[arg(value_name = "UUID/Title...")]
        servers: Vec<String>,
    },
    /// Delete servers
    Delete {
        /// Also delete every storage attached to the server
        #[arg(long)]
        delete_storages: bool,
        #[arg(value_name = "UUID/Title...")]
        servers: Vec<String>,
    },
    /// Load a storage as the CD-ROM of one server
    Load {
        #[arg(long, value_name = "UUID/Title")]
        storage: Option<String>,
        #[arg(value_name = "UUID/Title")]
        servers: Vec<String>,
    },
    /// Eject the CD-ROM of one server
    Eject {
        #[arg(value_name = "UUID/Title")]
        servers: Vec<String>,
    },
    /// Show servers
    Show {
        #[arg(value_name = "UUID/Title...")]
        servers: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    /// Modify storages
    Modify {
        #[arg(long)]
        title: Option<String>,
        /// New size in GB
        #[arg(long)]
        size: Option<u32>,
        #[arg(value_name = "UUID/Title...")]
        storages: Vec<String>,
    },
    /// Delete storages
    Delete {
        #[arg(value_name = "UUID/Title...")]
        storages: Vec<String>,
    },
    /// Show storages
    Show {
        #[arg(value_name = "UUID/Title...")]
        storages: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NetworkCommand {
    /// Modify networks
    Modify {
        #[arg(long)]
        name: Option<String>,
        /// IP network as key=value,... (address, family, gateway, dhcp,
        /// dhcp-default-route, dhcp-dns); repeatable
        #[arg(long = "ip-network", value_name = "KEY=VALUE,...")]
        ip_networks: Vec<String>,
        #[arg(value_name = "UUID/Name...")]
        networks: Vec<String>,
    },
    /// Delete networks
    Delete {
        #[arg(value_name = "UUID/Name...")]
        networks: Vec<String>,
    },
    /// Show networks
    Show {
        #[arg(value_name = "UUID/Name...")]
        networks: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RouterCommand {
    /// Rename routers
    Modify {
        #[arg(long)]
        name: Option<String>,
        #[arg(value_name = "UUID/Name...")]
        routers: Vec<String>,
    },
    /// Delete routers
    Delete {
        #[arg(value_name = "UUID/Name...")]
        routers: Vec<String>,
    },
    /// Show routers
    Show {
        #[arg(value_name = "UUID/Name...")]
        routers: Vec<String>,
    },
}

/// Resolve the effective configuration: file, then environment, then flags
pub fn effective_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(timeout) = cli.client_timeout {
        config.client_timeout_secs = timeout;
    }
    Ok(config)
}

/// Execution options for the current invocation
pub fn execution_options(cli: &Cli, config: &Config, cancel: &CancelSignal) -> ExecutionOptions {
    ExecutionOptions {
        exactly_one: false,
        max_actions_before_confirm: config.max_actions_before_confirm,
        confirm: !cli.force,
        workers: Some(config.workers.max(1)),
        wait: cli.wait.then(|| WaitOptions {
            interval: config.poll_interval(),
            timeout: config.wait_timeout(),
        }),
        cancel: Some(cancel.clone()),
        item_cancels: None,
    }
}

/// Fire `handle` on the first Ctrl-C, then resolve on the second one.
/// Stays pending if the signal cannot be installed.
pub async fn interrupt(handle: CancelHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        return std::future::pending().await;
    }
    tracing::warn!("Interrupted, cancelling prompt and pending waits");
    handle.cancel();
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run one parsed invocation; `cancel` aborts the prompt and any waits
pub async fn run(cli: Cli, cancel: CancelSignal) -> Result<(), CliError> {
    let config = effective_config(&cli)?;
    let credentials = config
        .credentials()
        .map_err(|e| CliError::validation(e.to_string()))?;
    let client = ApiClient::new(config.api_base()?, credentials).map_err(anyhow::Error::from)?;
    let service: Arc<dyn CloudService> = Arc::new(client);

    let invocation = Invocation {
        registry: ResolverRegistry::new(Arc::clone(&service)),
        service,
        log: LiveLog::stderr(),
        options: execution_options(&cli, &config, &cancel),
        output: cli.output,
    };
    invocation.dispatch(cli.command).await
}

/// Everything one command needs, built once per process
pub struct Invocation {
    pub service: Arc<dyn CloudService>,
    pub registry: ResolverRegistry,
    pub log: LiveLog,
    pub options: ExecutionOptions,
    pub output: OutputFormat,
}

impl Invocation {
    pub async fn dispatch(&self, command: Command) -> Result<(), CliError> {
        let service = Arc::clone(&self.service);
        match command {
            Command::Server(cmd) => match cmd {
                ServerCommand::Start { servers } => {
                    self.execute(&servers, StartServer::new(service), false).await
                }
                ServerCommand::Stop { stop_type, servers } => {
                    self.execute(&servers, StopServer::new(service, stop_type), false)
                        .await
                }
                ServerCommand::Restart {
                    stop_type,
                    timeout_action,
                    servers,
                } => {
                    let command = RestartServer::new(service, stop_type, timeout_action);
                    self.execute(&servers, command, false).await
                }
                ServerCommand::Delete {
                    delete_storages,
                    servers,
                } => {
                    self.execute(&servers, DeleteServer::new(service, delete_storages), false)
                        .await
                }
                ServerCommand::Load { storage, servers } => {
                    let storage = storage
                        .filter(|s| !s.trim().is_empty())
                        .ok_or_else(|| CliError::validation("storage is required"))?;
                    let storage_uuid = self
                        .registry
                        .resolve_one(ResourceKind::Storage, &storage)
                        .await
                        .map_err(BatchError::from)?;
                    self.execute(&servers, LoadCdrom::new(service, storage_uuid), true)
                        .await
                }
                ServerCommand::Eject { servers } => {
                    self.execute(&servers, EjectCdrom::new(service), true).await
                }
                ServerCommand::Show { servers } => self.show(ResourceKind::Server, &servers).await,
            },
            Command::Storage(cmd) => match cmd {
                StorageCommand::Modify {
                    title,
                    size,
                    storages,
                } => {
                    let command = ModifyStorage::new(service, title, size)?;
                    self.execute(&storages, command, false).await
                }
                StorageCommand::Delete { storages } => {
                    self.execute(&storages, DeleteStorage::new(service), false)
                        .await
                }
                StorageCommand::Show { storages } => {
                    self.show(ResourceKind::Storage, &storages).await
                }
            },
            Command::Network(cmd) => match cmd {
                NetworkCommand::Modify {
                    name,
                    ip_networks,
                    networks,
                } => {
                    let command = ModifyNetwork::new(service, name, &ip_networks)?;
                    self.execute(&networks, command, false).await
                }
                NetworkCommand::Delete { networks } => {
                    self.execute(&networks, DeleteNetwork::new(service), false)
                        .await
                }
                NetworkCommand::Show { networks } => {
                    self.show(ResourceKind::Network, &networks).await
                }
            },
            Command::Router(cmd) => match cmd {
                RouterCommand::Modify { name, routers } => {
                    let command = ModifyRouter::new(service, name)?;
                    self.execute(&routers, command, false).await
                }
                RouterCommand::Delete { routers } => {
                    self.execute(&routers, DeleteRouter::new(service), false)
                        .await
                }
                RouterCommand::Show { routers } => self.show(ResourceKind::Router, &routers).await,
            },
        }
    }

    async fn execute<C: BatchCommand>(
        &self,
        tokens: &[String],
        command: C,
        exactly_one: bool,
    ) -> Result<(), CliError> {
        let executor = BatchExecutor::new(&self.registry, self.log.clone(), Arc::new(TerminalConfirm));
        let options = ExecutionOptions {
            exactly_one,
            ..self.options.clone()
        };
        let outcome = executor.send(tokens, Arc::new(command), &options).await?;
        for error in outcome.errors() {
            tracing::error!(token = error.token(), "Item failed: {}", error);
        }

        render_outcome(
            &outcome,
            self.output,
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )?;

        if outcome.has_failures() {
            return Err(CliError::PartialFailure {
                failed: outcome.failed_count(),
                total: outcome.len(),
            });
        }
        Ok(())
    }

    async fn show(&self, kind: ResourceKind, tokens: &[String]) -> Result<(), CliError> {
        let records = commands::show(&self.registry, kind, tokens).await?;
        let mut out = io::stdout().lock();
        render_records(&records, self.output, &mut out)?;
        out.flush().map_err(anyhow::Error::from)?;
        Ok(())
    }
}
