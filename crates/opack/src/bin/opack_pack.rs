//! `opack-pack`: encode JSON (stdin) to opack (stdout).
//!
//! Usage:
//!   opack-pack [--no-index-values] [--no-optimized-indexed]
//!              [--key-split N] [--value-split N] [--max-depth N]

use opack::cli::{pack, parse_options};
use std::io::{self, Read, Write};

fn main() {
    let options = match parse_options(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match pack(buf.trim(), options) {
        Ok(bytes) => {
            if let Err(e) = io::stdout().write_all(&bytes) {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
