//! tpctl - TupleNet logical topology control tool
//!
//! Runs one topology operation against the entity store and prints the
//! result as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tuplenet_store::{
    config::{DEFAULT_HOST, DEFAULT_KEY_PREFIX, DEFAULT_PORT},
    MemoryStore, RedisStore, StoreConfig, TopologyStore,
};
use tuplenet_topology::*;

/// TupleNet logical topology control
#[derive(Parser, Debug)]
#[command(name = "tpctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Redis server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Redis server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Redis database index
    #[arg(long, default_value_t = 0)]
    db: i64,

    /// Key prefix of the entity view
    #[arg(long, default_value = DEFAULT_KEY_PREFIX)]
    prefix: String,

    /// Use an empty in-process store instead of Redis
    #[arg(long)]
    memory: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update a logical router
    AddRouter {
        name: String,
        /// Chassis to pin the router to
        #[arg(long)]
        chassis: Option<String>,
    },

    /// Link a router to a switch with a new port pair
    LinkSwitch {
        router: String,
        switch: String,
        /// Router port address, e.g. 10.0.0.1/24
        cidr: String,
    },

    /// Show one router, or all routers when no name is given
    ShowRouter { name: Option<String> },

    /// Delete a router
    DelRouter {
        name: String,
        /// Also delete its ports, static routes and NAT rules
        #[arg(short, long)]
        recursive: bool,
    },

    /// Add a router port that names its peer switch port
    AddPort {
        router: String,
        port: String,
        cidr: String,
        peer: String,
        /// Port MAC; derived from the address when omitted
        #[arg(long)]
        mac: Option<String>,
    },

    /// Show ports of a router
    ShowPort { router: String, port: Option<String> },

    /// Show whether a router port is linked
    PortState { router: String, port: String },

    /// Delete a router port
    DelPort { router: String, port: String },

    /// Add a static route to a router
    AddRoute {
        router: String,
        name: String,
        cidr: String,
        next_hop: String,
        out_port: String,
    },

    /// Show static routes of a router
    ShowRoute { router: String, name: Option<String> },

    /// Delete a static route
    DelRoute { router: String, name: String },

    /// Add a NAT rule to a router
    AddNat {
        router: String,
        name: String,
        cidr: String,
        /// snat or dnat
        nat_type: String,
        external_ip: String,
    },

    /// Show NAT rules of a router
    ShowNat { router: String, name: Option<String> },

    /// Delete a NAT rule
    DelNat { router: String, name: String },

    /// Create or update a logical switch
    AddSwitch { name: String },

    /// Show one switch, or all switches when no name is given
    ShowSwitch { name: Option<String> },

    /// Add a port to a switch
    AddSwitchPort {
        switch: String,
        port: String,
        ip: String,
        /// Router port this port is wired to
        #[arg(long)]
        peer: Option<String>,
        /// Port MAC; derived from the address when omitted
        #[arg(long)]
        mac: Option<String>,
    },

    /// Show ports of a switch
    ShowSwitchPort { switch: String, port: Option<String> },

    /// Delete a switch port
    DelSwitchPort { switch: String, port: String },

    /// Delete a switch
    DelSwitch {
        name: String,
        /// Also delete its ports
        #[arg(short, long)]
        recursive: bool,
    },

    /// Report broken links and orphaned ports, routes and NAT rules
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

async fn open_store(args: &Args) -> Result<Arc<dyn TopologyStore>> {
    if args.memory {
        debug!(prefix = %args.prefix, "Using in-process store");
        return Ok(Arc::new(MemoryStore::with_prefix(args.prefix.clone())));
    }

    let config = StoreConfig::new(args.host.clone(), args.port, args.db)
        .with_key_prefix(args.prefix.clone());
    let store = RedisStore::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.uri()))?;
    Ok(Arc::new(store))
}

async fn run(args: Args) -> Result<()> {
    let store = open_store(&args).await?;
    let manager = TopologyManager::new(store);

    match args.command {
        Command::AddRouter { name, chassis } => {
            print(&manager.add_router(AddRouter { name, chassis }).await?)
        }
        Command::LinkSwitch {
            router,
            switch,
            cidr,
        } => print(
            &manager
                .link_switch(LinkSwitch {
                    router,
                    switch,
                    cidr,
                })
                .await?,
        ),
        Command::ShowRouter { name } => {
            let all = name.is_none();
            print(&manager.show_router(ShowRouter { name, all }).await?)
        }
        Command::DelRouter { name, recursive } => {
            manager
                .delete_router(DeleteRouter { name, recursive })
                .await?;
            Ok(())
        }
        Command::AddPort {
            router,
            port,
            cidr,
            peer,
            mac,
        } => print(
            &manager
                .add_router_port(AddRouterPort {
                    router,
                    port,
                    cidr,
                    mac,
                    peer,
                })
                .await?,
        ),
        Command::ShowPort { router, port } => print(
            &manager
                .show_router_port(ShowRouterPort { router, port })
                .await?,
        ),
        Command::PortState { router, port } => {
            let state = manager
                .router_port_state(ShowRouterPort {
                    router,
                    port: Some(port),
                })
                .await?;
            println!("{:?}", state);
            Ok(())
        }
        Command::DelPort { router, port } => {
            manager
                .delete_router_port(DeleteRouterPort { router, port })
                .await?;
            Ok(())
        }
        Command::AddRoute {
            router,
            name,
            cidr,
            next_hop,
            out_port,
        } => print(
            &manager
                .add_static_route(AddStaticRoute {
                    router,
                    name,
                    cidr,
                    next_hop,
                    out_port,
                })
                .await?,
        ),
        Command::ShowRoute { router, name } => print(
            &manager
                .show_static_route(ShowStaticRoute { router, name })
                .await?,
        ),
        Command::DelRoute { router, name } => {
            manager
                .delete_static_route(DeleteStaticRoute { router, name })
                .await?;
            Ok(())
        }
        Command::AddNat {
            router,
            name,
            cidr,
            nat_type,
            external_ip,
        } => print(
            &manager
                .add_nat(AddNat {
                    router,
                    name,
                    cidr,
                    nat_type,
                    external_ip,
                })
                .await?,
        ),
        Command::ShowNat { router, name } => {
            print(&manager.show_nat(ShowNat { router, name }).await?)
        }
        Command::DelNat { router, name } => {
            manager.delete_nat(DeleteNat { router, name }).await?;
            Ok(())
        }
        Command::AddSwitch { name } => print(&manager.add_switch(AddSwitch { name }).await?),
        Command::ShowSwitch { name } => {
            let all = name.is_none();
            print(&manager.show_switch(ShowSwitch { name, all }).await?)
        }
        Command::AddSwitchPort {
            switch,
            port,
            ip,
            peer,
            mac,
        } => print(
            &manager
                .add_switch_port(AddSwitchPort {
                    switch,
                    port,
                    ip,
                    mac,
                    peer,
                })
                .await?,
        ),
        Command::ShowSwitchPort { switch, port } => print(
            &manager
                .show_switch_port(ShowSwitchPort { switch, port })
                .await?,
        ),
        Command::DelSwitchPort { switch, port } => {
            manager
                .delete_switch_port(DeleteSwitchPort { switch, port })
                .await?;
            Ok(())
        }
        Command::DelSwitch { name, recursive } => {
            manager
                .delete_switch(DeleteSwitch { name, recursive })
                .await?;
            Ok(())
        }
        Command::Check => {
            let issues = manager.check_links().await?;
            print(&issues)?;
            if issues.is_empty() {
                Ok(())
            } else {
                anyhow::bail!("{} inconsistent links", issues.len())
            }
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("encoding output")?;
    println!("{}", json);
    Ok(())
}
