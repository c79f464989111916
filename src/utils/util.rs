use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random alphanumeric string of exactly `len` bytes
pub fn rand_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
