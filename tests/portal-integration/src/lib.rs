use alloy_primitives::{keccak256, Address};

pub mod harness;

/// Install a test log subscriber once; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic account address for a participant name.
pub fn account_for(name: &str) -> Address {
    Address::from_word(keccak256(name.to_lowercase().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_are_stable_and_distinct() {
        assert_eq!(account_for("Alice"), account_for("alice"));
        assert_ne!(account_for("alice"), account_for("bob"));
    }
}
