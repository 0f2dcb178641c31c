#![allow(clippy::print_stderr)]

use clap::{CommandFactory, Parser, ValueHint};
use clap_complete::aot::{Shell, generate};
use std::ffi::OsString;
use std::io::stdout;
use std::process::ExitCode;
use unifd::{OpenFlags, open};

mod printer;

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
///list a directory through the unifd handle layer
struct Args {
    #[arg(
        value_name = "PATH",
        help = "Directory to list (defaults to the current one)",
        value_hint = ValueHint::DirPath,
        index = 1
    )]
    directory: Option<OsString>,

    #[arg(
        short = 'l',
        long = "long",
        help = "Long format: type, permission bits, size, last write time"
    )]
    long: bool,

    #[arg(
        short = 'n',
        long = "batch",
        value_name = "N",
        default_value_t = 0,
        help = "Read entries in batches of N (0 drains in one call)"
    )]
    batch: isize,

    #[arg(
        long = "completions",
        value_name = "SHELL",
        help = "Generate shell completions and exit"
    )]
    completions: Option<Shell>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        generate(shell, &mut Args::command(), "unifd", &mut stdout());
        return ExitCode::SUCCESS;
    }

    let directory = args.directory.unwrap_or_else(|| OsString::from("."));
    let mut file = match open(&directory, OpenFlags::READ, 0) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("unifd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut status = ExitCode::SUCCESS;
    loop {
        let (entries, err) = file.read_entries(args.batch);
        for entry in &entries {
            printer::print_entry(entry, args.long);
        }
        match err {
            None if args.batch > 0 => {} //batch filled exactly, keep going
            None => break,
            Some(e) if e.is_end_of_entries() => break,
            Some(e) => {
                eprintln!("unifd: {e}");
                status = ExitCode::FAILURE;
                break;
            }
        }
    }

    if let Err(e) = file.close() {
        eprintln!("unifd: {e}");
        status = ExitCode::FAILURE;
    }
    status
}
