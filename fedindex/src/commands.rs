use crate::CLAP_STYLING;
use clap::{arg, command};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("fedindex")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("fedindex")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Discover every instance reachable from a seed through its following and \
                followers collections, then write the HTML and JSON instance index.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed instance to start from (https:// is assumed if no scheme is given)"),
                )
                .arg(
                    arg!(-p --"proxy" <ADDR>)
                        .required(false)
                        .help("SOCKS proxy for onion hosts, as host:port or a socks5h:// URL"),
                )
                .arg(
                    arg!(--"tor")
                        .required(false)
                        .help("Route onion hosts through a local Tor daemon (127.0.0.1:9050 unless --proxy is set)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"force-proxy")
                        .required(false)
                        .help("Send every request through the proxy, not only onion hosts")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-onion")
                        .required(false)
                        .help("Refuse to crawl onion hosts even when a proxy is available")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("15"),
                )
                .arg(
                    arg!(--"max-concurrent" <NUM_TASKS>)
                        .required(false)
                        .help("Cap on instances crawled at once (default: unbounded)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory to write instance-index.html and instance-index.json into")
                        .default_value("."),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Log every request and every finished instance")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
