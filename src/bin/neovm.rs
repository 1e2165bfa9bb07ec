// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::error::Error;
use std::fs;
use std::rc::Rc;

use clap::{arg, Arg, ArgMatches, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use neovm::util::{FromHexString, ToHexString};
use neovm::{DefaultCrypto, FixedMessage, Interpreter};

fn main() -> Result<(), Box<dyn Error>> {
    // Parse command-line arguments
    let matches = Command::new("neovm")
        .about("NeoVM Tool")
        .version("0.1.0")
        .subcommand_required(true)
        .arg(arg!(--verbose "Show verbose output"))
        .subcommand(
            Command::new("run")
                .about("Execute a hex-encoded script and report HALT/FAULT plus the final stack")
                .arg(Arg::new("code").short('c').long("code"))
                .arg(Arg::new("message").short('m').long("message"))
                .arg(Arg::new("target").required(true))
                .visible_alias("r"),
        )
        .get_matches();
    // Extract top-level flags
    let verbose = matches.is_present("verbose");
    // Initialise logging
    if verbose {
        init_logging(LevelFilter::Trace);
    }
    // Dispatch on outcome
    let ok = match matches.subcommand() {
        Some(("run", args)) => run(args),
        _ => unreachable!(),
    }?;
    // Determine appropriate exit code
    let exitcode = if ok { 0 } else { 1 };
    // Done
    std::process::exit(exitcode);
}

/// Load, execute and report on a single script.
fn run(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    let mut hex = String::new();
    // Determine execution target
    let target = args.get_one::<String>("target").unwrap();
    // Decide whether bytecode provided directly, or via a file.
    if args.contains_id("code") {
        // Provided directly
        hex.push_str(target);
    } else {
        // Read hex from file
        let context = fs::read_to_string(target)?;
        for l in context.lines() {
            hex.push_str(l.trim());
        }
    }
    // Parse hex string into bytes
    let script = hex.from_hex_string()?;
    // Determine the signable message (defaults to empty for scripts
    // that never reach CHECKSIG/CHECKMULTISIG).
    let message = match args.get_one::<String>("message") {
        Some(m) => m.from_hex_string()?,
        None => Vec::new(),
    };
    // Construct a standalone interpreter: default crypto, no
    // APPCALL-resolvable scripts, only the four built-in interops.
    let mut interp = Interpreter::new(Rc::new(FixedMessage::new(message)), Rc::new(DefaultCrypto));
    // Execute the script as the entry frame.
    let halted = interp.execute_script(&script, false);
    if halted {
        println!("HALT");
    } else {
        println!("FAULT");
    }
    println!("stack depth: {}", interp.eval_stack().len());
    for (i, item) in interp.eval_stack().iter().enumerate() {
        if let Ok(bytes) = item.as_bytes_array() {
            let joined: Vec<u8> = bytes.into_iter().flatten().collect();
            println!("  [{}] {}", i, joined.to_hex_string());
        }
    }
    Ok(halted)
}

/// Initialise logging using a suitable pattern.
pub fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    //
    let stdout = ConsoleAppender::builder().encoder(Box::new(encoder)).build();
    //
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    //
    let _handle = log4rs::init_config(config).unwrap();
}
