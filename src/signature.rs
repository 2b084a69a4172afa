//! Request signing for paginated GraphQL requests
//!
//! The `X-Instagram-GIS` header is the lowercase hex MD5 digest of
//! `"{seed}:{variables}"`.

/// Compute the GIS signature for a seed and serialized variables payload.
///
/// Callers must not sign with an empty seed: the bootstrap request carries no
/// signature header at all. Use [`maybe_sign`] when the seed may be absent.
pub fn sign(seed: &str, variables: &str) -> String {
    let input = format!("{}:{}", seed, variables);
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Sign only when a seed is present
pub fn maybe_sign(seed: &str, variables: &str) -> Option<String> {
    if seed.is_empty() {
        None
    } else {
        Some(sign(seed, variables))
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn property_sign_is_deterministic(seed in "[a-f0-9]{1,32}", vars in ".{0,80}") {
            let first = sign(&seed, &vars);
            let second = sign(&seed, &vars);
            prop_assert_eq!(first.len(), 32);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn property_sign_changes_with_variables(seed in "[a-f0-9]{1,32}", vars in "[a-z]{1,40}") {
            let changed = format!("{}x", vars);
            prop_assert_ne!(sign(&seed, &vars), sign(&seed, &changed));
        }

        #[test]
        fn property_sign_changes_with_seed(seed in "[a-f0-9]{1,32}", vars in "[a-z]{0,40}") {
            let changed = format!("{}0", seed);
            prop_assert_ne!(sign(&seed, &vars), sign(&changed, &vars));
        }
    }
}
