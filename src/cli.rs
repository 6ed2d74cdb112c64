use crate::Args;
use anyhow::{anyhow, Result};
use std::io::Write;
use stream_token::config::{Config, Overrides};
use stream_token::{Token, TokenBuilder, TokenError};

/// Load the config the invocation asks for and apply the flags on top.
pub fn run_once(args: &Args) -> Result<Token> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Err(errors) = config.validate() {
        let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(anyhow!("Invalid configuration:\n{}", lines.join("\n")));
    }

    let request = config.apply(overrides_from(args));
    tracing::debug!(?request, "token request");

    let token = TokenBuilder::system().generate(request)?;
    Ok(token)
}

fn overrides_from(args: &Args) -> Overrides {
    Overrides {
        stream_id: args.stream_id.clone(),
        secret: args.key.clone(),
        vod_stream_id: args.vod.clone(),
        ip: args.ip.clone(),
        start_time: args.start_time.clone(),
        end_time: args.end_time.clone(),
        lifetime: args.lifetime.clone(),
    }
}

/// Print the outcome the way gen_token always has: everything on stdout,
/// token errors prefixed with a colon and followed by a blank line.
pub fn report(result: Result<Token>, out: &mut impl Write) -> u8 {
    let written = match &result {
        Ok(token) => writeln!(out, "{}", token),
        Err(err) => match err.downcast_ref::<TokenError>() {
            Some(token_err) => {
                tracing::debug!(kind = token_err.kind(), "token rejected");
                writeln!(out, ":{}\n", token_err)
            }
            None => writeln!(out, "{:#}", err),
        },
    };

    match (result, written) {
        (Ok(_), Ok(())) => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::NamedTempFile;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["gen-token"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_original_flag_spellings() {
        let args = parse(&[
            "-l", "3600", "-u", "YourStreamId", "-k", "demosecret123abc", "-s", "now", "-i",
            "1.2.3.4", "-v", "vod1", "-e", "99",
        ]);
        assert_eq!(args.lifetime.as_deref(), Some("3600"));
        assert_eq!(args.stream_id.as_deref(), Some("YourStreamId"));
        assert_eq!(args.key.as_deref(), Some("demosecret123abc"));
        assert_eq!(args.start_time.as_deref(), Some("now"));
        assert_eq!(args.ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(args.vod.as_deref(), Some("vod1"));
        assert_eq!(args.end_time.as_deref(), Some("99"));

        let long = parse(&["--end_time", "5", "--start_time", "1", "--stream_id", "x"]);
        assert_eq!(long.end_time.as_deref(), Some("5"));
        assert_eq!(long.start_time.as_deref(), Some("1"));
        assert_eq!(long.stream_id.as_deref(), Some("x"));
    }

    #[test]
    fn test_run_once_known_vector() {
        let file = config_file("");
        let path = file.path().to_str().unwrap();
        let args = parse(&[
            "--config", path, "-s", "1578935505", "-e", "1578935593", "-u", "YourStreamId",
            "-k", "demosecret123abc",
        ]);
        let token = run_once(&args).unwrap();
        assert_eq!(
            token.as_str(),
            "hdnts=st=1578935505~exp=1578935593~hmac=aaf01da130e5554eeb74159e9794c58748bc9f6b5706593775011964612b6d99"
        );
    }

    #[test]
    fn test_run_once_uses_config_defaults() {
        let file = config_file("stream_id = \"YourStreamId\"\nsecret = \"demosecret123abc\"\n");
        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "-s", "1578935505", "-e", "1578935593"]);
        let token = run_once(&args).unwrap();
        assert!(token.as_str().ends_with("aaf01da130e5554eeb74159e9794c58748bc9f6b5706593775011964612b6d99"));
    }

    #[test]
    fn test_run_once_rejects_invalid_config() {
        let file = config_file("lifetime = -1\n");
        let path = file.path().to_str().unwrap();
        let args = parse(&["--config", path, "-u", "x", "-k", "y", "-l", "10"]);
        let err = run_once(&args).unwrap_err();
        assert!(err.to_string().contains("[lifetime]"));
    }

    #[test]
    fn test_cli_lifetime_skips_file_validation() {
        let file = config_file("stream_id = \"s\"\nsecret = \"k\"\n");
        let path = file.path().to_str().unwrap();
        for lifetime in ["0", "-5"] {
            let args = parse(&["--config", path, "-l", lifetime]);
            let token = run_once(&args).unwrap();
            assert!(token.as_str().starts_with("hdnts=exp="));
        }

        let stored = config_file("stream_id = \"s\"\nsecret = \"k\"\nlifetime = 0\n");
        let path = stored.path().to_str().unwrap();
        let args = parse(&["--config", path, "-l", "60"]);
        assert!(run_once(&args).is_err());
    }

    #[test]
    fn test_report_token_error_format() {
        let mut out = Vec::new();
        let code = report(Err(TokenError::MissingSecret.into()), &mut out);
        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ":You must provide a secret.\n\n"
        );
    }

    #[test]
    fn test_report_success() {
        let token = TokenBuilder::new(stream_token::FixedClock(0))
            .generate(stream_token::TokenRequest::new("s", "k").with_end_time(10))
            .unwrap();
        let expected = format!("{}\n", token);
        let mut out = Vec::new();
        assert_eq!(report(Ok(token), &mut out), 0);
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_report_other_error() {
        let mut out = Vec::new();
        let code = report(Err(anyhow!("failed to read config x")), &mut out);
        assert_eq!(code, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "failed to read config x\n");
    }
}
