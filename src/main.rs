use clap::Parser;
use cluster_tree_tools::cli::{Args, Commands};
use cluster_tree_tools::commands;

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Render(render) => commands::render::run(render),
        Commands::Stats {
            tree,
            bins,
            prune,
        } => commands::stats::run(tree, bins, prune),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
