use std::env;
use std::net::SocketAddr;
use std::process;
use std::str::FromStr;

use chrono_tz::Tz;
use getopts::{Matches, Options};
use mycampus_parser::Site;
use tokio::time::Duration;
use url::Url;

use crate::cache;

const DEFAULT_BASE_URL: &str = "https://www.stfx.ca";
const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Halifax;
const DEFAULT_USER_AGENT: &str = "MyCampusGO-SchoolProject/0.1 (+contact: student project)";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

pub struct Args {
    pub address: SocketAddr,
    pub site: Site,
    pub user_agent: String,
    pub cache: cache::Config,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "b",
        "base-url",
        "Site to scrape [Default: https://www.stfx.ca]",
        "URL",
    );
    opts.optopt(
        "z",
        "timezone",
        "IANA timezone of the site's events [Default: America/Halifax]",
        "TZ",
    );
    opts.optopt(
        "u",
        "user-agent",
        "User-Agent header sent upstream",
        "USER_AGENT",
    );
    opts.optflag("n", "no-cache", "Disable caching of scraped results");
    opts.optopt(
        "t",
        "cache-ttl",
        "Time-to-live for cached results [Default: 300]",
        "SECONDS",
    );
    opts
}

fn get_or_exit<T>(matches: &Matches, name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match matches.opt_get_default(name, default) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Provided value for option '{name}' is invalid: {err}");
            process::exit(1);
        }
    }
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = get_or_exit(
        &matches,
        "address",
        SocketAddr::from(([127, 0, 0, 1], 8080)),
    );

    let base_url = matches
        .opt_str("base-url")
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = match Url::parse(&base_url) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("Provided value for option 'base-url' is invalid: {err}");
            process::exit(1);
        }
    };

    let timezone = get_or_exit(&matches, "timezone", DEFAULT_TIMEZONE);

    let user_agent = matches
        .opt_str("user-agent")
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let cache_ttl = Duration::from_secs(get_or_exit(&matches, "cache-ttl", DEFAULT_CACHE_TTL_SECS));

    Args {
        address,
        site: Site::new(base_url, timezone),
        user_agent,
        cache: cache::Config {
            enabled: !matches.opt_present("no-cache"),
            ttl: cache_ttl,
        },
    }
}
