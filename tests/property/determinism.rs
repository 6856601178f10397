//! Property-based tests for digest determinism

use hashdb::tree::{ContentHasher, HashAlgorithm};
use hashdb::types::{Digest, EntryKind};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Hashing a file equals hashing its bytes, and is repeatable
    #[test]
    fn file_digest_is_deterministic(content in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob");
        fs::write(&path, &content).unwrap();

        for algorithm in [HashAlgorithm::Sha512, HashAlgorithm::Blake3] {
            let hasher = ContentHasher::new(algorithm);
            let first = hasher.hash(&path, EntryKind::RegularFile).unwrap();
            let second = hasher.hash(&path, EntryKind::RegularFile).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first, algorithm.digest(&content));
        }
    }

    /// Flipping any single bit changes the digest
    #[test]
    fn single_bit_flip_changes_digest(
        content in proptest::collection::vec(any::<u8>(), 1..1024),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut flipped = content.clone();
        let i = index.index(flipped.len());
        flipped[i] ^= 1 << bit;

        let algorithm = HashAlgorithm::default();
        prop_assert_ne!(algorithm.digest(&content), algorithm.digest(&flipped));
    }

    /// Hex digests round-trip through parsing regardless of case
    #[test]
    fn digest_hex_parsing_normalizes_case(
        bytes in prop_oneof![
            proptest::collection::vec(any::<u8>(), 32),
            proptest::collection::vec(any::<u8>(), 64),
        ]
    ) {
        let digest = Digest::from_bytes(&bytes);
        let upper = digest.as_str().to_uppercase();
        prop_assert_eq!(Digest::from_hex(&upper).unwrap(), digest);
    }
}
