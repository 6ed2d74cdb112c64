use proptest::prelude::*;
use stream_token::{BigInt, FixedClock, TokenBuilder, TokenError, TokenRequest};

fn builder() -> TokenBuilder<FixedClock> {
    TokenBuilder::new(FixedClock(1_600_000_000))
}

proptest! {
    #[test]
    fn prop_generate_is_deterministic(
        stream in "[A-Za-z0-9_]{0,16}",
        secret in "[ -~]{1,32}",
        start in 0i64..2_000_000_000,
        span in 1i64..1_000_000,
    ) {
        let request = TokenRequest::new(stream, secret)
            .with_start_time(start)
            .with_end_time(start + span);
        let a = builder().generate(request.clone()).unwrap();
        let b = builder().generate(request).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_start_not_before_end_is_rejected(
        end in 0i64..2_000_000_000,
        ahead in 0i64..1_000_000,
    ) {
        let start = end + ahead;
        let request = TokenRequest::new("s", "k")
            .with_start_time(start)
            .with_end_time(end);
        prop_assert_eq!(
            builder().generate(request).unwrap_err(),
            TokenError::WindowOrderError {
                start_time: BigInt::from(start),
                end_time: BigInt::from(end),
            }
        );
    }

    #[test]
    fn prop_fields_in_order_without_placeholders(
        vod in proptest::option::of("[a-z0-9]{0,8}"),
        ip in proptest::option::of("[0-9.]{0,15}"),
        start in proptest::option::of(0i64..1_000),
    ) {
        let mut request = TokenRequest::new("s", "k").with_end_time(5_000);
        request.vod_stream_id = vod.clone();
        request.ip = ip.clone();
        request.start_time = start.map(|s| s.to_string());

        let token = builder().generate(request).unwrap();
        let body = token.as_str().strip_prefix("hdnts=").unwrap();
        let names: Vec<&str> = body
            .split('~')
            .map(|field| field.split_once('=').unwrap().0)
            .collect();

        let mut expected = Vec::new();
        if vod.is_some() { expected.push("vod"); }
        if ip.is_some() { expected.push("ip"); }
        if start.is_some() { expected.push("st"); }
        expected.push("exp");
        expected.push("hmac");
        prop_assert_eq!(names, expected);
    }
}
