use crate::CLAP_STYLING;
use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, arg, value_parser};
use std::path::PathBuf;
use webwalk_core::config::MAX_SPACES_PER_INDENT;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("webwalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("webwalk")
        .about("Recursively walk a web site and report the pages and resources it references")
        .styles(CLAP_STYLING)
        .arg(
            arg!(<URL>)
                .help("The URL to walk")
                .required(true),
        )
        .arg(
            arg!(-d --"depth" <INT>)
                .required(false)
                .help("The maximum depth to search. 0 means no maximum")
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            arg!(-e --"exclude" <PATTERN>)
                .required(false)
                .help(
                    "Do not traverse URLs that match this regex. May be repeated. \
                Affects what is searched",
                )
                .action(ArgAction::Append),
        )
        .arg(
            arg!(-i --"include" <PATTERN>)
                .required(false)
                .help(
                    "Only traverse URLs that match at least one of these regexes. May be \
                repeated. Affects what is searched",
                )
                .action(ArgAction::Append),
        )
        .arg(
            arg!(-f --"filter" <PATTERN>)
                .required(false)
                .help(
                    "Only report and mirror URLs that match at least one of these regexes. \
                May be repeated. Does not affect what is searched",
                )
                .action(ArgAction::Append),
        )
        .arg(
            arg!(-I --"indent")
                .required(false)
                .help("Indent each URL by its depth in the page hierarchy")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-s --"spaces-per-indent" <INT>)
                .required(false)
                .help("Spaces to indent per level when --indent is given")
                .value_parser(
                    RangedU64ValueParser::<usize>::new().range(0..=MAX_SPACES_PER_INDENT as u64),
                )
                .default_value("3"),
        )
        .arg(
            arg!(-R --"relurl")
                .required(false)
                .help("Show each URL relative to the page that references it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-n --"no-warnings")
                .required(false)
                .help("Do not report missing or unreachable URLs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help(
                    "Increase verbosity: -v adds the content length, -vv the content type, \
                -vvv the response headers",
                )
                .action(ArgAction::Count),
        )
        .arg(
            arg!(-r --"replicate" <DIR>)
                .required(false)
                .help("Replicate the reported content under DIR, keeping the site's layout")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-c --"copy" <DIR>)
                .required(false)
                .help("Copy every reported file directly into DIR")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-u --"username" <NAME>)
                .required(false)
                .help("User name for HTTP basic authentication. Prompts for the password if none is given"),
        )
        .arg(
            arg!(-P --"password" <PASSWORD>)
                .required(false)
                .help("Password for HTTP basic authentication. Visible in the shell history"),
        )
        .arg(
            arg!(-p --"password-file" <FILE>)
                .required(false)
                .help("File containing the password for HTTP basic authentication")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-k --"insecure")
                .required(false)
                .help("Do not verify TLS certificates")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(--"follow-external")
                .required(false)
                .help("Also expand pages outside of the root URL's directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"debug")
                .required(false)
                .help("Log debugging information to stderr. Useful for debugging regex patterns")
                .action(ArgAction::SetTrue),
        )
}
