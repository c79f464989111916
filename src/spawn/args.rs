use std::fmt::Display;

/// Replace the value of `--flag=...` in `args`, or append it when absent
pub fn patch_args(
    mut args: Vec<String>,
    flag: &str,
    new_value: &str,
) -> Vec<String> {
    let patched = format!("--{flag}={new_value}");
    let prefix = format!("--{flag}=");
    match args.iter_mut().find(|arg| arg.starts_with(&prefix)) {
        Some(arg) => *arg = patched,
        None => args.push(patched),
    }
    args
}

/// Whether `err` reports a client that gave up dialing the cluster
pub fn is_grpc_timed_out(err: &dyn Display) -> bool {
    err.to_string().contains("grpc: timed out trying to connect")
}
