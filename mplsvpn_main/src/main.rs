// MplsVpn: Compiling MPLS L3VPN Network Intent
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use mplsvpn::config::CompilerConfig;
use mplsvpn::printer;
use mplsvpn::topology::{read_topology, Topology};
use mplsvpn::validator::validate;
use mplsvpn::{compile, CompiledNetwork, Error as CompileError};

use clap::{Args, Parser, Subcommand};
use log::*;
use std::error::Error;
use std::fs::write;
use std::path::PathBuf;
use std::process::exit;

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    // match on the action
    match args.cmd {
        MainCommand::Validate { file } => {
            let topo = read_topology(&file)?;
            match validate(&topo) {
                Ok(valid) => {
                    println!(
                        "{} is valid: {} routers, {} subnets, backbone {}",
                        file.display(),
                        topo.routers().len(),
                        valid.links().len(),
                        valid.backbone()
                    );
                }
                Err(errors) => {
                    for line in printer::validation_errors(&errors) {
                        eprintln!("{}", line);
                    }
                    error!("{} is invalid: {} violations", file.display(), errors.len());
                    exit(1);
                }
            }
        }
        MainCommand::Compile { file, json_filename, config } => {
            let topo = read_topology(&file)?;
            let net = compile_or_exit(&topo, &config.into_config())?;
            let json = net.to_json()?;
            match json_filename {
                Some(out) => {
                    write(&out, json)?;
                    info!("Compiled network written to {}", out.display());
                }
                None => println!("{}", json),
            }
        }
        MainCommand::Recap { file, config } => {
            let topo = read_topology(&file)?;
            let net = compile_or_exit(&topo, &config.into_config())?;
            printer::print_recap(&net);
        }
    }

    Ok(())
}

/// Compile the topology. Validation errors are printed one per line, and terminate the program.
fn compile_or_exit(
    topo: &Topology,
    config: &CompilerConfig,
) -> Result<CompiledNetwork, Box<dyn Error>> {
    match compile(topo, config) {
        Ok(net) => Ok(net),
        Err(CompileError::ValidationErrors(errors)) => {
            for line in printer::validation_errors(&errors) {
                eprintln!("{}", line);
            }
            error!("The topology is invalid: {} violations", errors.len());
            exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Compiler for MPLS L3VPN network intent. Reads a topology document (JSON), validates it,
/// allocates all addresses and derives the OSPF, LDP and MP-BGP plan of every router.
#[derive(Parser, Debug)]
#[clap(author = "Tibor Schneider", version)]
struct CommandLineArguments {
    /// Action to perform
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Parse and validate the topology, and print every violation
    #[clap(name = "validate")]
    Validate {
        /// Topology document
        file: PathBuf,
    },
    /// Compile the topology and print the resolved network as JSON
    #[clap(name = "compile")]
    Compile {
        /// Topology document
        file: PathBuf,
        /// Write the JSON to this file instead of stdout
        #[clap(long = "json")]
        json_filename: Option<PathBuf>,
        /// Compiler constants
        #[clap(flatten)]
        config: ConfigArguments,
    },
    /// Compile the topology and print the network recap (subnets, addresses and VPNs)
    #[clap(name = "recap")]
    Recap {
        /// Topology document
        file: PathBuf,
        /// Compiler constants
        #[clap(flatten)]
        config: ConfigArguments,
    },
}

/// Overrides for the compiler constants. Unset values keep their default.
#[derive(Args, Debug)]
struct ConfigArguments {
    /// OSPF cost of interfaces without `ospf_cost` (1 to 65535)
    #[clap(long)]
    default_ospf_cost: Option<u32>,
    /// OSPF area of the core
    #[clap(long)]
    ospf_area: Option<u32>,
    /// OSPF process id
    #[clap(long)]
    ospf_process_id: Option<u32>,
    /// Prefix length of point-to-point links
    #[clap(long)]
    link_prefix_len: Option<u8>,
    /// Number of hosts to skip at the start of every loopback pool
    #[clap(long)]
    loopback_offset: Option<u32>,
}

impl ConfigArguments {
    fn into_config(self) -> CompilerConfig {
        let mut config = CompilerConfig::default();
        if let Some(x) = self.default_ospf_cost {
            config.default_ospf_cost = x;
        }
        if let Some(x) = self.ospf_area {
            config.ospf_area = x;
        }
        if let Some(x) = self.ospf_process_id {
            config.ospf_process_id = x;
        }
        if let Some(x) = self.link_prefix_len {
            config.link_prefix_len = x;
        }
        if let Some(x) = self.loopback_offset {
            config.loopback_offset = x;
        }
        debug!("Using {:?}", config);
        config
    }
}
