use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use arith_coder::{compress_file, decompress_file};

#[derive(Parser)]
#[command(name = "arith_coder", version, about = "Static arithmetic coder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a UTF-8 text file into a self-contained container
    Compress {
        input: PathBuf,
        output: PathBuf,
    },
    /// Restore the original text from a container
    Decompress {
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress { input, output } => compress_file(&input, &output).map(|stats| {
            println!(
                "{} bytes -> {} bytes ({:.2}% saved, {:.3} bits/symbol)",
                stats.original_bytes,
                stats.compressed_bytes,
                stats.saved_percent(),
                stats.bits_per_symbol()
            );
        }),
        Commands::Decompress { input, output } => decompress_file(&input, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
