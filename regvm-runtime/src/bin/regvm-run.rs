//! CLI tool for running regvm programs

use regvm_runtime::{Runtime, RuntimeConfig};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: regvm-run <program.txt> [--debug]");
        process::exit(1);
    }

    let file_path = &args[1];
    let debug = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    let config = match RuntimeConfig::load(None) {
        Ok(config) => config.with_debug(debug),
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(1);
        }
    };

    let mut runtime = Runtime::new(config);

    match runtime.run_file(file_path) {
        Ok(report) => {
            if !debug {
                println!("✅ Program executed successfully");
                println!("\n{report}");
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("❌ Runtime error: {}", e);
            process::exit(1);
        }
    }
}
