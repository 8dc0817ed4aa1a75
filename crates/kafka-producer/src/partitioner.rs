//! Key to partition routing.
//!
//! Both hashes are pure functions of the key bytes, so for a fixed partition
//! count a key always maps to the same partition.

/// Hash used to route a key to a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Partitioner {
    /// 32-bit FNV-1a read as a signed integer, remainder taken and the
    /// sign dropped. Matches kafka-go's and sarama's hash partitioners.
    #[default]
    Fnv1a,
    /// The Java client's default: murmur2, sign bit cleared, modulo the
    /// partition count. Matches records written by JVM producers.
    Murmur2,
}

impl Partitioner {
    /// Partition for `key` among `partitions` partitions.
    ///
    /// `partitions` must be positive; zero or negative counts route to 0.
    pub fn partition(&self, key: &[u8], partitions: i32) -> i32 {
        if partitions <= 0 {
            return 0;
        }
        match self {
            // |i32::MIN % n| < n for n > 1, so abs() cannot overflow
            Partitioner::Fnv1a => ((fnv1a(key) as i32) % partitions).abs(),
            Partitioner::Murmur2 => ((murmur2(key) & 0x7fff_ffff) % partitions as u32) as i32,
        }
    }
}

pub fn fnv1a(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    data.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(PRIME)
    })
}

pub fn murmur2(data: &[u8]) -> u32 {
    const SEED: u32 = 0x9747_b28c;
    const M: u32 = 0x5bd1_e995;
    const R: u32 = 24;

    let mut h = SEED ^ data.len() as u32;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= u32::from(tail[2]) << 16;
    }
    if tail.len() >= 2 {
        h ^= u32::from(tail[1]) << 8;
    }
    if !tail.is_empty() {
        h ^= u32::from(tail[0]);
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}
