//! `benchpipe` binary entry point.

fn main() {
    if let Err(e) = benchpipe_cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
