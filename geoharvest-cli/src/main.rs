//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = geoharvest_cli::run() {
        eprintln!("geoharvest: {err}");
        std::process::exit(1);
    }
}
