//! cdns-dump, a command-line reader for C-DNS capture files.

#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_copy_implementations)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(single_use_lifetimes)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![deny(unsafe_code)]


use std::env;
use std::process::exit;

use log::*;

use cdns::File;

mod options;
use self::options::{Options, OptionsResult};


/// Configures logging, parses the command-line options, and opens the
/// requested file, before handing off to either a summary or a full dump.
fn main() {
    configure_logger();

    let options = match Options::parse(env::args_os().skip(1)) {
        OptionsResult::Ok(options) => options,
        OptionsResult::Help => {
            print!("{}", options::USAGE);
            exit(exits::SUCCESS);
        }
        OptionsResult::InvalidOptions(why) => {
            eprintln!("{why}");
            exit(exits::OPTIONS_ERROR);
        }
    };

    info!("running with options -> {options:?}");
    exit(run(&options));
}

fn run(options: &Options) -> i32 {
    let file = match File::open(&options.path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("cdns-dump: couldn't open {}: {e}", options.path.display());
            return exits::IO_ERROR;
        }
    };

    if options.text_dump {
        return dump_text(&file, options);
    }

    summarize(file)
}

fn dump_text(file: &File, options: &Options) -> i32 {
    let result = match &options.output {
        Some(path) => file.dump(path),
        None => file.dump_to_writer(&mut std::io::stdout()),
    };

    match result {
        Ok(()) => exits::SUCCESS,
        Err(e) => {
            eprintln!("cdns-dump: dump failed: {e}");
            exits::DECODE_ERROR
        }
    }
}

fn summarize(mut file: File) -> i32 {
    let mut nb_blocks = 0usize;
    let mut nb_queries = 0usize;

    loop {
        match file.open_block() {
            Ok(Some(block)) => {
                nb_blocks += 1;
                nb_queries += block.queries.len();
            }
            Ok(None) => break,
            Err(e) => {
                error!("decode failed after {nb_blocks} blocks: {e}");
                eprintln!("cdns-dump: decode error: {e}");
                println!("{nb_blocks} blocks, {nb_queries} queries (truncated)");
                return exits::DECODE_ERROR;
            }
        }
    }

    println!("{nb_blocks} blocks, {nb_queries} queries");
    exits::SUCCESS
}

/// Checks the `CDNS_DEBUG` environment variable, enabling debug logging if
/// it's non-empty.
fn configure_logger() {
    let present = match env::var_os("CDNS_DEBUG") {
        Some(debug) => !debug.is_empty(),
        None => false,
    };

    let mut logs = env_logger::Builder::new();
    if present {
        let _ = logs.filter(None, log::LevelFilter::Debug);
    } else {
        let _ = logs.filter(None, log::LevelFilter::Off);
    }

    logs.init();
}


mod exits {
    #![allow(unused)]

    /// Exit code for when everything turns out OK.
    pub const SUCCESS: i32 = 0;

    /// Exit code for when the file couldn't be read from disk.
    pub const IO_ERROR: i32 = 1;

    /// Exit code for when the file's bytes didn't decode as valid C-DNS.
    pub const DECODE_ERROR: i32 = 2;

    /// Exit code for when the command-line options are invalid.
    pub const OPTIONS_ERROR: i32 = 3;
}
