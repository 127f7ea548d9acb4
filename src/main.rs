use std::process;

use clap::{Parser, Subcommand};

use prefab::models;
use prefab::setup;

#[derive(Parser)]
#[command(name = "prefab", about = "Photonic fabrication prediction client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link your account via the browser
    Setup,
    /// List the hosted prediction models
    Models,
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Setup => {
            if let Err(e) = setup::run_setup() {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Commands::Models => {
            println!(
                "{:<20} {:<24} {:<9} {:<9} {}",
                "MODEL", "PROCESS", "VERSION", "DATASET", "TAG"
            );
            for model in models::registry() {
                println!(
                    "{:<20} {:<24} {:<9} {:<9} {}",
                    model.name,
                    format!("{} {}", model.foundry, model.process),
                    model.version,
                    model.dataset,
                    model.tag,
                );
            }
        }
    }
}
