//! surface-expr command line
//!
//! Parses, inspects and evaluates expressions outside a running host. Useful
//! for checking button text and feedback expressions by hand.

use surface_expr::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
