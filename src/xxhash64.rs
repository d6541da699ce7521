pub const DIGEST_SIZE_BYTES: usize = 64 / 8;
pub const BLOCK_SIZE_BYTES: usize = 256 / 8;

const PRIME64_1: u64 = 0x9E3779B185EBCA87;
const PRIME64_2: u64 = 0xC2B2AE3D27D4EB4F;
const PRIME64_3: u64 = 0x165667B19E3779F9;
const PRIME64_4: u64 = 0x85EBCA77C2B2AE63;
const PRIME64_5: u64 = 0x27D4EB2F165667C5;

/// The streaming xxHash64 accumulator.
///
/// Input can arrive in arbitrary chunks: bytes that don't yet complete a
/// 32-byte block are held in an internal buffer and folded into the lanes
/// once the block fills. The digest is a pure read over the current state,
/// so it can be queried at any point of the stream, any number of times,
/// interleaved with further writes.
#[derive(Clone, Debug)]
pub struct XxHash64 {
    seed: u64,
    lanes: [u64; 4],
    total_len: u64,
    buf: [u8; BLOCK_SIZE_BYTES],
    buf_len: usize, // Always < BLOCK_SIZE_BYTES between calls.
}

impl XxHash64 {
    /// Creates an accumulator with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Creates an accumulator with the given seed.
    ///
    /// The seed perturbs the initial lane state and the digest of inputs
    /// shorter than one block, giving a distinct hash family per seed.
    pub fn with_seed(seed: u64) -> Self {
        let mut x = XxHash64 {
            seed,
            lanes: [0; 4],
            total_len: 0,
            buf: [0; BLOCK_SIZE_BYTES],
            buf_len: 0,
        };
        x.reset();
        x
    }

    /// Returns the accumulator to its initial state, keeping the seed.
    pub fn reset(&mut self) {
        self.lanes = [
            self.seed.wrapping_add(PRIME64_1).wrapping_add(PRIME64_2),
            self.seed.wrapping_add(PRIME64_2),
            self.seed,
            self.seed.wrapping_sub(PRIME64_1),
        ];
        self.total_len = 0;
        self.buf = [0; BLOCK_SIZE_BYTES];
        self.buf_len = 0;
    }

    /// Appends `input` to the logical stream.
    ///
    /// Returns the number of bytes consumed, which is always the full input
    /// length; there is no error condition.
    pub fn write(&mut self, input: &[u8]) -> usize {
        let len = input.len();
        self.total_len = self.total_len.wrapping_add(len as u64);

        // Input that doesn't complete a block is just stashed.
        if self.buf_len + len < BLOCK_SIZE_BYTES {
            self.buf[self.buf_len..self.buf_len + len].copy_from_slice(input);
            self.buf_len += len;
            return len;
        }

        let mut input = input;

        // Top up a partially filled buffer and fold it in.
        if self.buf_len > 0 {
            let fill = BLOCK_SIZE_BYTES - self.buf_len;
            self.buf[self.buf_len..].copy_from_slice(&input[..fill]);
            let block = self.buf;
            self.compress(&block);
            self.buf_len = 0;
            input = &input[fill..];
        }

        // Full blocks straight from the input.
        while input.len() >= BLOCK_SIZE_BYTES {
            let block = (&input[..BLOCK_SIZE_BYTES]).try_into().unwrap();
            self.compress(block);
            input = &input[BLOCK_SIZE_BYTES..];
        }

        // Whatever remains becomes the new tail.
        if !input.is_empty() {
            self.buf[..input.len()].copy_from_slice(input);
            self.buf_len = input.len();
        }

        len
    }

    fn compress(&mut self, block: &[u8; BLOCK_SIZE_BYTES]) {
        // Copy the block into the right layout.
        let words = [
            u64::from_le_bytes((&block[0..8]).try_into().unwrap()),
            u64::from_le_bytes((&block[8..16]).try_into().unwrap()),
            u64::from_le_bytes((&block[16..24]).try_into().unwrap()),
            u64::from_le_bytes((&block[24..32]).try_into().unwrap()),
        ];

        for i in 0..4 {
            self.lanes[i] = round(self.lanes[i], words[i]);
        }
    }

    /// Computes the digest of everything written so far.
    ///
    /// Pure read: the lanes, length, and buffered tail are untouched, so
    /// writes may continue afterwards as if this was never called. The
    /// buffered tail is re-mixed from the live buffer on every call.
    pub fn sum64(&self) -> u64 {
        let mut h = if self.total_len >= BLOCK_SIZE_BYTES as u64 {
            let mut acc = self.lanes[0]
                .rotate_left(1)
                .wrapping_add(self.lanes[1].rotate_left(7))
                .wrapping_add(self.lanes[2].rotate_left(12))
                .wrapping_add(self.lanes[3].rotate_left(18));

            for &lane in self.lanes.iter() {
                acc ^= round(0, lane);
                acc = acc.wrapping_mul(PRIME64_1).wrapping_add(PRIME64_4);
            }
            acc
        } else {
            // The lanes never absorbed anything.
            self.seed.wrapping_add(PRIME64_5)
        };

        h = h.wrapping_add(self.total_len);

        let mut tail = &self.buf[..self.buf_len];
        while tail.len() >= 8 {
            let w = u64::from_le_bytes((&tail[..8]).try_into().unwrap());
            h ^= round(0, w);
            h = h
                .rotate_left(27)
                .wrapping_mul(PRIME64_1)
                .wrapping_add(PRIME64_4);
            tail = &tail[8..];
        }
        if tail.len() >= 4 {
            let w = u32::from_le_bytes((&tail[..4]).try_into().unwrap()) as u64;
            h ^= w.wrapping_mul(PRIME64_1);
            h = h
                .rotate_left(23)
                .wrapping_mul(PRIME64_2)
                .wrapping_add(PRIME64_3);
            tail = &tail[4..];
        }
        for &byte in tail {
            h ^= (byte as u64).wrapping_mul(PRIME64_5);
            h = h.rotate_left(11).wrapping_mul(PRIME64_1);
        }

        h ^= h >> 33;
        h = h.wrapping_mul(PRIME64_2);
        h ^= h >> 29;
        h = h.wrapping_mul(PRIME64_3);
        h ^= h >> 32;

        h
    }

    /// Appends the 8 digest bytes, most significant first, to `prefix` and
    /// returns the combined buffer.
    pub fn sum(&self, mut prefix: Vec<u8>) -> Vec<u8> {
        prefix.extend_from_slice(&self.sum64().to_be_bytes());
        prefix
    }

    /// The digest as 16 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.sum64())
    }

    pub fn digest_size(&self) -> usize {
        DIGEST_SIZE_BYTES
    }

    pub fn block_size(&self) -> usize {
        BLOCK_SIZE_BYTES
    }

    /// One-shot hash with seed 0.
    pub fn hash(data: &[u8]) -> u64 {
        Self::hash_with_seed(data, 0)
    }

    /// One-shot hash with the given seed.
    pub fn hash_with_seed(data: &[u8], seed: u64) -> u64 {
        let mut x = Self::with_seed(seed);
        x.write(data);
        x.sum64()
    }
}

#[inline]
fn round(lane: u64, word: u64) -> u64 {
    lane.wrapping_add(word.wrapping_mul(PRIME64_2))
        .rotate_left(31)
        .wrapping_mul(PRIME64_1)
}

impl Default for XxHash64 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::hash::Hasher for XxHash64 {
    fn write(&mut self, bytes: &[u8]) {
        XxHash64::write(self, bytes);
    }

    fn finish(&self) -> u64 {
        self.sum64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known-good xxHash64 digests, all with seed 0.
    // Lengths are chosen to land on every code path: each tail pass on its
    // own and combined, an exact block, and multi-block inputs with and
    // without ragged tails.
    const TEST_VECTORS: &[(&str, u64, &str)] = &[
        ("", 0xef46db3751d8e999, "ef46db3751d8e999"),
        ("a", 0xd24ec4f1a98c6e5b, "d24ec4f1a98c6e5b"),
        ("ab", 0x65f708ca92d04a61, "65f708ca92d04a61"),
        ("abc", 0x44bc2cf5ad770999, "44bc2cf5ad770999"),
        ("abcd", 0xde0327b0d25d92cc, "de0327b0d25d92cc"),
        ("abcde", 0x07e3670c0c8dc7eb, "07e3670c0c8dc7eb"),
        ("abcdef", 0xfa8afd82c423144d, "fa8afd82c423144d"),
        ("abcdefg", 0x1860940e2902822d, "1860940e2902822d"),
        ("abcdefgh", 0x3ad351775b4634b7, "3ad351775b4634b7"),
        ("abcdefghi", 0x27f1a34fdbb95e13, "27f1a34fdbb95e13"),
        ("abcdefghij", 0xd6287a1de5498bb2, "d6287a1de5498bb2"),
        ("abcdefghijkl", 0x4b09b7d3a233d4b3, "4b09b7d3a233d4b3"),
        ("abcdefghijklm", 0x934adbc0ebc51325, "934adbc0ebc51325"),
        ("abcdefghijklmnop", 0x71ce8137ca2dd53d, "71ce8137ca2dd53d"),
        ("abcdefghijklmnopq", 0x8feff49d8f62f402, "8feff49d8f62f402"),
        ("abcdefghijklmnopqrstuvwx", 0x0bec95e34669983b, "0bec95e34669983b"),
        (
            "abcdefghijklmnopqrstuvwxyz",
            0xcfe1f278fa89835c,
            "cfe1f278fa89835c",
        ),
        ("1", 0xb7b41276360564d4, "b7b41276360564d4"),
        ("123456", 0x2b2dc38aaa53c322, "2b2dc38aaa53c322"),
        ("123456789", 0x8cb841db40e6ae83, "8cb841db40e6ae83"),
        ("Hello, World!!", 0x2266b8937637bc8c, "2266b8937637bc8c"),
        (
            "Discard medicine more than two years old.",
            0x32740dc06f97c972,
            "32740dc06f97c972",
        ),
        (
            "He who has a shady past knows that nice guys finish last.",
            0x208697e054dcc560,
            "208697e054dcc560",
        ),
        (
            "There is no reason for any individual to have a computer in \
             their home. -Ken Olsen, 1977",
            0x7a62f82bb064224b,
            "7a62f82bb064224b",
        ),
        (
            "The fugacity of a constituent in a mixture of gases at a given \
             temperature is proportional to its mole fraction.  \
             Lewis-Randall Rule",
            0xc8d969ddc5fefc58,
            "c8d969ddc5fefc58",
        ),
    ];

    #[test]
    fn reference_vectors() {
        let mut x = XxHash64::new();
        for &(input, digest, hex) in TEST_VECTORS {
            x.reset();
            x.write(input.as_bytes());
            assert_eq!(x.sum64(), digest, "input {:?}", input);
            assert_eq!(x.to_hex(), hex, "input {:?}", input);
        }
    }

    #[test]
    fn one_shot_matches_streaming() {
        for &(input, digest, _) in TEST_VECTORS {
            assert_eq!(XxHash64::hash(input.as_bytes()), digest);
            assert_eq!(XxHash64::hash_with_seed(input.as_bytes(), 0), digest);
        }
    }

    #[test]
    fn chunking_is_invisible() {
        let input = b"The major problem is with sendmail.  -Mark Horton";
        let expected = XxHash64::hash(input);

        // Every split point, including the degenerate ones.
        for split in 0..=input.len() {
            let mut x = XxHash64::new();
            x.write(&input[..split]);
            x.write(&input[split..]);
            assert_eq!(x.sum64(), expected, "split at {}", split);
        }

        // Byte at a time.
        let mut x = XxHash64::new();
        for &byte in input.iter() {
            x.write(&[byte]);
        }
        assert_eq!(x.sum64(), expected);
    }

    #[test]
    fn block_boundary_crossing() {
        // 6 + 26 bytes crosses the 32-byte block boundary mid-write.
        let mut split = XxHash64::new();
        split.write(b"123456");
        split.write(b"abcdefghijklmnopqrstuvwxyz");

        let mut whole = XxHash64::new();
        whole.write(b"123456abcdefghijklmnopqrstuvwxyz");

        assert_eq!(split.sum64(), whole.sum64());
        assert_eq!(
            split.sum64(),
            XxHash64::hash(b"123456abcdefghijklmnopqrstuvwxyz")
        );
    }

    #[test]
    fn exact_block_fills() {
        let input: Vec<u8> = (0u8..96).collect();
        let expected = XxHash64::hash(&input);

        // Buffer filled to exactly 32 before the second write flushes it.
        let mut x = XxHash64::new();
        x.write(&input[..31]);
        x.write(&input[31..32]);
        x.write(&input[32..]);
        assert_eq!(x.sum64(), expected);

        // 16 + 16 + 64.
        let mut x = XxHash64::new();
        x.write(&input[..16]);
        x.write(&input[16..32]);
        x.write(&input[32..]);
        assert_eq!(x.sum64(), expected);
    }

    #[test]
    fn empty_writes_are_accepted() {
        let mut x = XxHash64::new();
        assert_eq!(x.write(b""), 0);
        assert_eq!(x.sum64(), 0xef46db3751d8e999);

        x.write(b"a");
        x.write(b"");
        assert_eq!(x.sum64(), 0xd24ec4f1a98c6e5b);
    }

    #[test]
    fn write_reports_bytes_consumed() {
        let mut x = XxHash64::new();
        assert_eq!(x.write(b"abc"), 3);
        assert_eq!(x.write(&[0u8; 100]), 100);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut x = XxHash64::with_seed(7);
        x.write(b"some junk that spans more than one block aaaaaaaaaaaaaa");
        x.reset();

        let fresh = XxHash64::with_seed(7);
        assert_eq!(x.sum64(), fresh.sum64());

        // And behaves like fresh under subsequent writes.
        let mut fresh = fresh;
        x.write(b"abcdefghijklmnopqrstuvwxyz");
        fresh.write(b"abcdefghijklmnopqrstuvwxyz");
        assert_eq!(x.sum64(), fresh.sum64());
    }

    #[test]
    fn digest_is_a_pure_read() {
        let mut x = XxHash64::new();
        x.write(b"abcdefghijklmnop");

        let first = x.sum64();
        for _ in 0..10 {
            assert_eq!(x.sum64(), first);
        }

        // Interleaved digests don't disturb later writes.
        x.write(b"qrstuvwxyz");
        assert_eq!(x.sum64(), XxHash64::hash(b"abcdefghijklmnopqrstuvwxyz"));
    }

    #[test]
    fn seed_selects_a_distinct_hash_family() {
        assert_ne!(XxHash64::hash_with_seed(b"", 1), XxHash64::hash(b""));
        assert_ne!(
            XxHash64::hash_with_seed(b"abc", 1),
            XxHash64::hash_with_seed(b"abc", 2)
        );

        // Seeded empty input takes the short path: seed + PRIME64_5,
        // then length add and final mix.
        let a = XxHash64::with_seed(0xdeadbeef).sum64();
        let b = XxHash64::with_seed(0xdeadbeef).sum64();
        assert_eq!(a, b);
    }

    #[test]
    fn sum_appends_big_endian_bytes() {
        let x = XxHash64::new();

        // Digest of the empty input is 0xef46db3751d8e999.
        assert_eq!(
            x.sum(Vec::new()),
            &[0xef, 0x46, 0xdb, 0x37, 0x51, 0xd8, 0xe9, 0x99]
        );

        // Prefix is preserved in front.
        assert_eq!(
            x.sum(vec![0xaa, 0xbb]),
            &[0xaa, 0xbb, 0xef, 0x46, 0xdb, 0x37, 0x51, 0xd8, 0xe9, 0x99]
        );
    }

    #[test]
    fn hex_matches_byte_rendering() {
        let mut x = XxHash64::new();
        for &(input, _, _) in TEST_VECTORS {
            x.reset();
            x.write(input.as_bytes());

            let hex = x.to_hex();
            assert_eq!(hex.len(), 16);

            let from_bytes: String =
                x.sum(Vec::new()).iter().map(|b| format!("{:02x}", b)).collect();
            assert_eq!(hex, from_bytes);
        }
    }

    #[test]
    fn size_reporters() {
        let x = XxHash64::new();
        assert_eq!(x.digest_size(), 8);
        assert_eq!(x.block_size(), 32);
    }

    #[test]
    fn std_hasher_impl() {
        use std::hash::Hasher;

        let mut x = XxHash64::new();
        Hasher::write(&mut x, b"abcdefghijklmnopqrstuvwxyz");
        assert_eq!(x.finish(), 0xcfe1f278fa89835c);

        // finish is non-destructive, like sum64.
        assert_eq!(x.finish(), x.sum64());
    }

    #[test]
    fn clone_snapshots_mid_stream() {
        let mut x = XxHash64::new();
        x.write(b"123456abcdefghijklmnopqrst");

        let snapshot = x.clone();
        x.write(b"uvwxyz");

        assert_eq!(snapshot.sum64(), XxHash64::hash(b"123456abcdefghijklmnopqrst"));
        assert_eq!(
            x.sum64(),
            XxHash64::hash(b"123456abcdefghijklmnopqrstuvwxyz")
        );
    }
}
