use std::collections::BTreeMap;

use super::*;

fn sample() -> FlagSet {
    let mut fields = FlagSet::default();
    fields.insert("endpoints", "http://127.0.0.1:2379,http://127.0.0.1:22379");
    fields.insert("dial-timeout", "7s");
    fields.insert("insecure-skip-tls-verify", "true");
    fields
}

#[test]
fn test_env_key_upper_cases_and_maps_hyphens() {
    assert_eq!(env_key("endpoints"), "ETCDCTL_ENDPOINTS");
    assert_eq!(env_key("dial-timeout"), "ETCDCTL_DIAL_TIMEOUT");
    assert_eq!(env_key("insecure-skip-tls-verify"), "ETCDCTL_INSECURE_SKIP_TLS_VERIFY");
}

#[test]
fn test_flags_encoding_is_sorted_by_key() {
    let InvocationVector::Flags(flags) = Encoding::Flags.encode(&sample()) else {
        panic!("expected flags");
    };

    assert_eq!(
        flags,
        vec![
            "--dial-timeout=7s",
            "--endpoints=http://127.0.0.1:2379,http://127.0.0.1:22379",
            "--insecure-skip-tls-verify=true",
        ]
    );
}

#[test]
fn test_both_encodings_carry_the_same_fields() {
    let fields = sample();
    let InvocationVector::Flags(flags) = Encoding::Flags.encode(&fields) else {
        panic!("expected flags");
    };
    let InvocationVector::Env(env) = Encoding::Env.encode(&fields) else {
        panic!("expected env");
    };

    let from_flags: BTreeMap<String, String> = flags
        .iter()
        .map(|flag| {
            let (key, value) = flag.trim_start_matches("--").split_once('=').unwrap();
            (env_key(key), value.to_string())
        })
        .collect();
    assert_eq!(from_flags, env);
}

#[test]
fn test_value_containing_equals_sign_is_kept_whole() {
    let mut fields = FlagSet::default();
    fields.insert("user", "root:pa=ss");

    assert_eq!(
        Encoding::Flags.encode(&fields),
        InvocationVector::Flags(vec!["--user=root:pa=ss".to_string()])
    );
    assert_eq!(fields.get("user"), Some("root:pa=ss"));
    assert_eq!(fields.len(), 1);
}
