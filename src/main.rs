use pokemon_battle_rooms::{run, CliOptions};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [--matches N] [--seed SEED] [--dex dex.json] [--rules rules.json] \
[--output summary.json] [--verbose]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut matches = 100usize;
    let mut seed = 0u64;
    let mut dex_path = None;
    let mut rules_path = None;
    let mut output_path = None;
    let mut verbose = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--matches" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--matches requires a number"))?;
                matches = val.parse()?;
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                seed = val.parse()?;
            }
            "--dex" => {
                dex_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--dex requires a path (e.g. --dex dex.json)")
                })?);
            }
            "--rules" => {
                rules_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--rules requires a path (e.g. --rules rules.json)")
                })?);
            }
            "--output" => {
                output_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--output requires a path (e.g. --output summary.json)")
                })?);
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(CliOptions {
        matches,
        seed,
        dex_path,
        rules_path,
        output_path,
        verbose,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let opts = parse_args()?;
    run(opts)
}
