//! Content addressing for DAS preimages: a keccak merkle tree over 64 KiB
//! bins whose root binds the total preimage length.

use alloy_primitives::{keccak256, B256};

/// Size of one leaf bin.
const BIN_SIZE: usize = 64 * 1024;

/// Domain byte prepended to leaf hashes.
const LEAF_BYTE: u8 = 0xfe;

/// Domain byte prepended to internal nodes and the length-bound root.
const NODE_BYTE: u8 = 0xff;

/// Lifts a flat (v0) hash into the leaf encoding of the tree scheme.
pub fn flat_hash_to_tree_leaf(flat: B256) -> [u8; 33] {
    let mut leaf = [0u8; 33];
    leaf[0] = LEAF_BYTE;
    leaf[1..].copy_from_slice(flat.as_slice());
    leaf
}

/// Remaps a flat (v0) hash to the key the tree scheme stores it under.
pub fn flat_hash_to_tree_hash(flat: B256) -> B256 {
    keccak256(flat_hash_to_tree_leaf(flat))
}

fn leaf_hash(bin: &[u8]) -> B256 {
    keccak256(flat_hash_to_tree_leaf(keccak256(bin)))
}

fn node_hash(left: B256, right: B256) -> B256 {
    let mut node = [0u8; 65];
    node[0] = NODE_BYTE;
    node[1..33].copy_from_slice(left.as_slice());
    node[33..].copy_from_slice(right.as_slice());
    keccak256(node)
}

/// Tree-hashes a preimage: leaves are double keccaks of 64 KiB bins,
/// parents pair adjacent nodes (an odd node is promoted), and the root
/// keccaks the top node together with the preimage length.
pub fn hash(preimage: &[u8]) -> B256 {
    let mut layer: Vec<B256> = if preimage.is_empty() {
        vec![leaf_hash(&[])]
    } else {
        preimage.chunks(BIN_SIZE).map(leaf_hash).collect()
    };
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| if pair.len() == 2 { node_hash(pair[0], pair[1]) } else { pair[0] })
            .collect();
    }
    let mut root = [0u8; 41];
    root[0] = NODE_BYTE;
    root[1..33].copy_from_slice(layer[0].as_slice());
    root[33..].copy_from_slice(&(preimage.len() as u64).to_be_bytes());
    keccak256(root)
}
