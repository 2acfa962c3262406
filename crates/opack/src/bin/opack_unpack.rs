//! `opack-unpack`: decode opack (stdin) to JSON (stdout).
//!
//! Usage:
//!   opack-unpack [--max-depth N] [--max-output-bytes N]

use opack::cli::{parse_unpack_options, unpack};
use std::io::{self, Read, Write};

fn main() {
    let options = match parse_unpack_options(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let mut buf = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match unpack(&buf, options) {
        Ok(json) => {
            if let Err(e) = io::stdout().write_all(json.as_bytes()) {
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
