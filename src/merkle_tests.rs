#[cfg(test)]
mod tests {
    use crate::error::MerkleError;
    use crate::merkle::{
        calculate_merkle_root, calculate_merkle_tree_height, generate_merkle_proof, hash_leaves,
        hash_value, verify_merkle_proof, ZERO_HASH,
    };
    use crate::MerkleTree;

    fn numbered_leaves(count: usize) -> Vec<[u8; 32]> {
        (0..count)
            .map(|i| {
                let mut leaf = [0u8; 32];
                leaf[0..4].copy_from_slice(&(i as u32).to_be_bytes());
                leaf
            })
            .collect()
    }

    fn decode(hex_str: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(hex_str).unwrap());
        out
    }

    #[test]
    fn test_merkle_tree_height() {
        let expected = [(0, 0), (1, 0), (2, 1), (3, 2), (4, 2), (5, 3), (8, 3), (9, 4)];
        for (count, height) in expected {
            assert_eq!(calculate_merkle_tree_height(count), height, "n = {count}");
        }
    }

    #[test]
    fn test_empty_tree_has_zero_root() {
        let tree = MerkleTree::new(Vec::new());
        assert_eq!(tree.root, ZERO_HASH);
        assert_eq!(tree.height(), 0);
        assert_eq!(
            tree.generate_proof(0),
            Err(MerkleError::PositionOutOfBounds {
                position: 0,
                leaf_count: 0
            })
        );
    }

    #[test]
    fn test_single_leaf_tree() {
        let leaf = [7u8; 32];
        let tree = MerkleTree::new(vec![leaf]);
        assert_eq!(tree.root, leaf);

        let proof = tree.generate_proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(tree.verify_proof(&proof));
    }

    #[test]
    fn test_pair_hash_vector() {
        assert_eq!(
            hash_leaves(&[1u8; 32], &[2u8; 32]),
            decode("346d8c96a2454213fcc0daff3c96ad0398148181b9fa6488f7ae2c0af5b20aa0")
        );
        assert_eq!(
            hash_value("hello"),
            decode("1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8")
        );
    }

    #[test]
    fn test_merkle_root_vectors() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];
        assert_eq!(
            calculate_merkle_root(&leaves),
            decode("99976d3b1539e7cfaca77649ac7536fec61db00fb0835634915b4d542fff06ae")
        );
        assert_eq!(
            calculate_merkle_root(&leaves[..3]),
            decode("f17b43cfed88243bdf6dc35c1e917ee7460117346bdbd87c194db398c00b6973")
        );
    }

    #[test]
    fn test_odd_leaf_is_duplicated_not_zero_padded() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        let left = hash_leaves(&leaves[0], &leaves[1]);
        let expected = hash_leaves(&left, &hash_leaves(&leaves[2], &leaves[2]));

        let root = calculate_merkle_root(&leaves);
        assert_eq!(root, expected);
        assert_ne!(root, hash_leaves(&left, &hash_leaves(&leaves[2], &[0u8; 32])));
    }

    #[test]
    fn test_merkle_proof_generation() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];

        let tree = MerkleTree::new(leaves);
        let proof = tree.generate_proof(0).unwrap();

        assert_eq!(proof.leaf, [1u8; 32]);
        assert_eq!(proof.root, tree.root);
        assert_eq!(proof.siblings.len(), 2);
        assert_eq!(proof.siblings[0], [2u8; 32]);
    }

    #[test]
    fn test_last_odd_leaf_uses_itself_as_sibling() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        let proof = generate_merkle_proof(2, &leaves).unwrap();
        assert_eq!(proof[0], [3u8; 32]);
        assert_eq!(proof[1], hash_leaves(&leaves[0], &leaves[1]));
        assert!(verify_merkle_proof(
            &leaves[2],
            2,
            &proof,
            &calculate_merkle_root(&leaves)
        ));
    }

    #[test]
    fn test_every_position_verifies_for_sizes_up_to_64() {
        for count in 1..=64 {
            let leaves = numbered_leaves(count);
            let root = calculate_merkle_root(&leaves);
            for position in 0..count {
                let proof = generate_merkle_proof(position, &leaves).unwrap();
                assert_eq!(proof.len(), calculate_merkle_tree_height(count));
                assert!(
                    verify_merkle_proof(&leaves[position], position, &proof, &root),
                    "position {position} of {count}"
                );
            }
        }
    }

    #[test]
    fn test_merkle_proof_invalid_verification() {
        let leaves1 = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];

        let leaves2 = vec![[5u8; 32], [6u8; 32], [7u8; 32], [8u8; 32]];

        let tree1 = MerkleTree::new(leaves1);
        let tree2 = MerkleTree::new(leaves2);

        let proof = tree1.generate_proof(0).unwrap();

        // Should fail because proof is from different tree
        assert!(!tree2.verify_proof(&proof));
    }

    #[test]
    fn test_large_merkle_tree() {
        let tree = MerkleTree::new(numbered_leaves(1024));
        let proof = tree.generate_proof(512).unwrap();

        assert_eq!(tree.height(), 10);
        assert!(tree.verify_proof(&proof));
    }

    #[test]
    fn test_merkle_proof_with_invalid_index() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];

        let tree = MerkleTree::new(leaves);

        assert_eq!(
            tree.generate_proof(999),
            Err(MerkleError::PositionOutOfBounds {
                position: 999,
                leaf_count: 4
            })
        );
    }

    #[test]
    fn test_merkle_proof_with_tampered_root() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];

        let tree = MerkleTree::new(leaves);
        let mut proof = tree.generate_proof(0).unwrap();

        proof.root = [0xFFu8; 32];

        assert!(!tree.verify_proof(&proof));
    }

    #[test]
    fn test_merkle_proof_with_tampered_leaf() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];

        let tree = MerkleTree::new(leaves);
        let mut proof = tree.generate_proof(0).unwrap();

        proof.leaf = [0xFFu8; 32];

        assert!(!tree.verify_proof(&proof));
    }

    #[test]
    fn test_merkle_proof_with_tampered_siblings() {
        let leaves = vec![[1u8; 32], [2u8; 32], [3u8; 32], [4u8; 32]];

        let tree = MerkleTree::new(leaves);
        let mut proof = tree.generate_proof(0).unwrap();

        proof.siblings[0] = [0xFFu8; 32];

        assert!(!tree.verify_proof(&proof));
    }

    #[test]
    fn test_truncated_proof_rejected() {
        let tree = MerkleTree::new(numbered_leaves(8));
        let mut proof = tree.generate_proof(3).unwrap();
        proof.siblings.pop();
        assert!(!tree.verify_proof(&proof));
    }

    #[test]
    fn test_position_of() {
        let tree = MerkleTree::new(numbered_leaves(5));
        assert_eq!(tree.position_of(&tree.leaves[3]), Some(3));
        assert_eq!(tree.position_of(&[0xAAu8; 32]), None);
    }

    #[test]
    fn test_proof_display() {
        let tree = MerkleTree::new(vec![[1u8; 32], [2u8; 32]]);
        let shown = tree.generate_proof(1).unwrap().to_string();
        assert!(shown.contains("Index: 1"));
        assert!(shown.contains("Siblings: 1"));
        assert!(shown.contains(&format!("0x{}", hex::encode([2u8; 32]))));
    }
}
