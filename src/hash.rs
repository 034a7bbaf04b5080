use std::hash::Hasher;

/// Seed of the hash documented by the file format.
const SEED: u64 = 5381;

/// The 64-bit DJB-style hash that places keys into subtables.
///
/// Per input byte `b` the state advances as `h = ((h << 5) + h) ^ b` in
/// wrapping u64 arithmetic, starting from 5381. The low byte of the final
/// state selects one of the 256 subtables; the remaining bits pick the home
/// slot within it.
///
/// Readers and writers are generic over `H: Hasher + Default` with
/// `DjbHash` as the default. A store written with one hasher must be read
/// with the same one; a mismatch produces spurious misses, never
/// corruption.
#[derive(Clone, Debug)]
pub struct DjbHash {
    state: u64,
}

impl DjbHash {
    pub const fn new() -> Self {
        DjbHash { state: SEED }
    }

    /// Restores the seed so the same instance can hash another input.
    pub fn reset(&mut self) {
        self.state = SEED;
    }
}

impl Default for DjbHash {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for DjbHash {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut state = self.state;
        for &b in bytes {
            state = (state << 5).wrapping_add(state) ^ u64::from(b);
        }
        self.state = state;
    }

    // The trait default would hash native-endian bytes; pin little-endian
    // so values are stable across platforms.
    fn write_u64(&mut self, i: u64) {
        self.write(&i.to_le_bytes());
    }
}
