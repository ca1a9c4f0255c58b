use colored::Colorize;
use std::io::{self, IsTerminal};
use std::process;
use tracing::info;
use webwalk::{CliOptions, command_argument_builder, init_tracing, prompt_credentials, run};

fn exit_with_error(error: anyhow::Error) -> ! {
    let prefix = if io::stderr().is_terminal() {
        "ERROR".red().bold().to_string()
    } else {
        "ERROR".to_string()
    };
    eprintln!("{}: {:#}", prefix, error);
    process::exit(1);
}

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let options = CliOptions::from_matches(&matches);
    init_tracing(options.debug);

    // Any password prompt happens here, before the interrupt handler below
    // is installed, so ^C at the prompt ends the process straight away.
    let credentials = prompt_credentials(&options).unwrap_or_else(|e| exit_with_error(e));

    let outcome = tokio::select! {
        outcome = run(&options, credentials) => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n^C interrupt");
            process::exit(1);
        }
    };

    match outcome {
        Ok(summary) => info!("Walk finished: {}", summary),
        Err(e) => exit_with_error(e),
    }
}
