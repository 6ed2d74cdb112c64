mod cli;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const ABOUT: &str = "Generate authentication tokens for protected stream targets.";

const LONG_ABOUT: &str = "\
Generate authentication tokens for protected stream targets.

To access a protected stream target, requests must provide a parameter
block generated by this tool, otherwise the request will be blocked.

Any token is tied to a specific stream id and has a limited lifetime.
Optionally, additional parameters can be factored in, for example the
client's IP address, or a start time denoting from when on the token is
valid. Keep in mind that the stream target configuration has to match
these optional parameters in some cases.";

const EXAMPLES: &str = "\
Examples:

  # Generate a token that is valid for 1 hour (3600 seconds)
  # and protects the stream id YourStreamId with a secret value of
  # demosecret123abc
  gen-token -l 3600 -u YourStreamId -k demosecret123abc
  hdnts=exp=1579792240~hmac=efe1cef703a1951c7e01e49257ae33487adcf80ec91db2d264130fbe0daeb7ed

  # Generate a token that is valid from 1578935505 to 1578935593
  # seconds after 1970-01-01 00:00 UTC (Unix epoch time)
  gen-token -s 1578935505 -e 1578935593 -u YourStreamId -k demosecret123abc
  hdnts=st=1578935505~exp=1578935593~hmac=aaf01da130e5554eeb74159e9794c58748bc9f6b5706593775011964612b6d99";

#[derive(Parser)]
#[command(
    name = "gen-token",
    version,
    about = ABOUT,
    long_about = LONG_ABOUT,
    after_help = EXAMPLES
)]
pub struct Args {
    #[arg(
        short = 'l',
        long = "lifetime",
        allow_hyphen_values = true,
        value_name = "SECONDS",
        help = "Token expires after SECONDS. --lifetime or --end_time is mandatory."
    )]
    pub lifetime: Option<String>,

    #[arg(
        short = 'e',
        long = "end_time",
        allow_hyphen_values = true,
        visible_alias = "end-time",
        value_name = "EPOCH",
        help = "Token expiration in Unix Epoch seconds. --end_time overrides --lifetime."
    )]
    pub end_time: Option<String>,

    #[arg(
        short = 'u',
        long = "stream_id",
        visible_alias = "stream-id",
        value_name = "STREAMID",
        help = "STREAMID to validate the token against."
    )]
    pub stream_id: Option<String>,

    #[arg(
        short = 'k',
        long = "key",
        env = stream_token::config::SECRET_ENV_VAR,
        hide_env_values = true,
        help = "Secret required to generate the token. Do not share this secret."
    )]
    pub key: Option<String>,

    #[arg(
        short = 's',
        long = "start_time",
        allow_hyphen_values = true,
        visible_alias = "start-time",
        value_name = "EPOCH",
        help = "(Optional) Start time in Unix Epoch seconds. Use 'now' for the current time."
    )]
    pub start_time: Option<String>,

    #[arg(
        short = 'i',
        long = "ip",
        help = "(Optional) The token is only valid for this IP Address."
    )]
    pub ip: Option<String>,

    #[arg(
        short = 'v',
        long = "vod",
        help = "(Optional) The token is only valid for this VOD Stream."
    )]
    pub vod: Option<String>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Verbose output (debug logging on stderr)")]
    pub verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    let result = cli::run_once(&args);
    let code = cli::report(result, &mut std::io::stdout().lock());
    ExitCode::from(code)
}
