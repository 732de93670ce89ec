use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Builder;
use log::error;

use dslab_fog_network::{PhysicalTopology, TopologyConfig};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Builds fog network topology from YAML file, computes and prints switching tables.
struct Args {
    /// Path to topology file
    #[arg(short, long, default_value = "topology.yaml")]
    config: String,
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let mut topology = match TopologyConfig::from_file(&args.config).and_then(|config| config.build()) {
        Ok(topology) => topology,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if topology.validate_topology() {
        println!("Topology validation successful");
    } else {
        println!("Topology validation UNsuccessful");
        return ExitCode::FAILURE;
    }
    if let Err(e) = topology.set_up_entities() {
        error!("Topology setup failed: {}", e);
        return ExitCode::FAILURE;
    }

    print_switching_tables(&topology);
    ExitCode::SUCCESS
}

fn print_switching_tables(topology: &PhysicalTopology) {
    let name = |id| topology.node_name(id).unwrap_or("?");
    for sw in topology.switches() {
        println!("{}", sw.name());
        for (dst, link_id) in sw.switching_table() {
            let Some(link) = topology.link(*link_id) else {
                continue;
            };
            let latency = topology.route_latency(sw.id(), *dst).unwrap_or(f64::INFINITY);
            println!(
                "\t{} ---> {} via {} (latency {:.1})",
                name(*dst),
                link.other_endpoint(sw.id()).map_or("?", name),
                link.name,
                latency
            );
        }
    }
}
