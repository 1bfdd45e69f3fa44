//! Session-stable pseudo-random picks.
//!
//! Every pick hashes the session seed together with a salt, so the same
//! inputs produce the same choice for the whole session.

use sha2::{Digest, Sha256};

use super::geometry::{Coords, Direction};

pub fn seeded_index(seed: u64, salt: &[&[u8]], len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    for part in salt {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(head) % len as u64) as usize
}

pub fn dialog_variant(seed: u64, node_key: &str, len: usize) -> usize {
    seeded_index(seed, &[b"dialog", node_key.as_bytes()], len)
}

pub fn terrain_variant(seed: u64, coords: Coords, len: usize) -> usize {
    seeded_index(
        seed,
        &[b"terrain", &coords.x.to_le_bytes(), &coords.y.to_le_bytes()],
        len,
    )
}

pub fn wander_direction(seed: u64, tick: u64, coords: Coords) -> Direction {
    let index = seeded_index(
        seed,
        &[
            b"wander",
            &tick.to_le_bytes(),
            &coords.x.to_le_bytes(),
            &coords.y.to_le_bytes(),
        ],
        Direction::ALL.len(),
    );
    Direction::ALL[index]
}
