//! Headless runner: feed bytes from stdin through the terminal core and
//! print the resulting grid. Useful for debugging escape handling and for
//! golden tests driven from the shell:
//!
//! ```sh
//! printf 'hi\x1b[1;1Hyo' | matcha-headless --cols 20 --rows 5
//! ```

use std::io::Read;
use std::process::exit;

use matcha_term::Terminal;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cols = 80usize;
    let mut rows = 24usize;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cols" => cols = parse_dim(args.next()),
            "--rows" => rows = parse_dim(args.next()),
            "--help" | "-h" => {
                eprintln!("usage: matcha-headless [--cols N] [--rows N] < input");
                return;
            }
            other => {
                eprintln!("unknown argument: {}", other);
                exit(2);
            }
        }
    }

    let mut input = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut input) {
        eprintln!("failed to read stdin: {}", e);
        exit(1);
    }

    let mut term = Terminal::new(cols, rows);
    term.process(&input);

    for y in 0..term.screen().rows() {
        println!("{}", term.screen().line(y).text());
    }
}

fn parse_dim(value: Option<String>) -> usize {
    match value.and_then(|v| v.parse::<usize>().ok()) {
        Some(n) if n > 0 => n,
        _ => {
            eprintln!("--cols/--rows expect a positive integer");
            exit(2);
        }
    }
}
