/*!
   Utilities for random value generation.
*/

use rand::Rng;

/// Generates a random `u32` value.
pub fn random_u32() -> u32 {
    let mut rng = rand::thread_rng();
    rng.gen()
}

/// Generates a random lowercase alphanumeric string of the given length.
pub fn random_string(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/**
   Turn an arbitrary test name such as `tests::upgrade::test_upgrade` into
   a string that is accepted by Docker as part of a container or network
   name.
*/
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = sanitized.trim_matches(|c| c == '-' || c == '.' || c == '_');

    if trimmed.is_empty() {
        "test".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_test_names() {
        assert_eq!(
            sanitize_name("tests::upgrade::test_upgrade"),
            "tests--upgrade--test_upgrade"
        );
        assert_eq!(sanitize_name("::"), "test");
        assert_eq!(sanitize_name("TestRandom"), "testrandom");
    }

    #[test]
    fn random_string_has_requested_length() {
        let s = random_string(8);
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
