/// Read an environment variable, parsing it to the desired type.
///
/// Unset and unparsable values both read as `None`.
pub fn get_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
