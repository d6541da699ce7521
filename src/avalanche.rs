use std::{fs::File, path::Path};

use nanorand::{Rng, WyRand};

use crate::xxhash64::DIGEST_SIZE_BYTES;

/// Flip statistics for a hash function: for every (input bit, digest bit)
/// pairing, how often flipping that input bit flipped that digest bit.
pub struct AvalancheChart {
    pub input_bit_len: usize,
    pub output_bit_len: usize,

    // The number of samples accumulated.  Or put another way, the number of
    // rounds used to generate the chart.
    pub sample_count: usize,

    // `input_bit_len * output_bit_len` long.  Each element is a count of the
    // number of digest bit flips for a given in/out bit pairing.
    pub chart: Vec<u32>,
}

/// Min/avg/max of one chart statistic.
pub struct Summary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl AvalancheChart {
    pub fn new(input_bit_len: usize) -> Self {
        let output_bit_len = DIGEST_SIZE_BYTES * 8;
        Self {
            input_bit_len,
            output_bit_len,
            sample_count: 0,
            chart: vec![0; input_bit_len * output_bit_len],
        }
    }

    pub fn accumulate(&mut self, in_bit: usize, out_bit: usize, flipped: bool) {
        self.chart[in_bit * self.output_bit_len + out_bit] += flipped as u32;
    }

    pub fn get_row(&self, in_bit: usize) -> &[u32] {
        let start = in_bit * self.output_bit_len;
        let end = start + self.output_bit_len;
        &self.chart[start..end]
    }

    /// Estimated probability that flipping `in_bit` flips `out_bit`.
    /// Ideal mixing puts this at 0.5 for every pairing.
    pub fn flip_probability(&self, in_bit: usize, out_bit: usize) -> f64 {
        self.chart[in_bit * self.output_bit_len + out_bit] as f64 / self.sample_count as f64
    }

    /// How many digest bits, out of the full digest width, a single input
    /// bit effectively reaches.
    pub fn row_diffusion(&self, in_bit: usize) -> f64 {
        let norm = 1.0 / self.sample_count as f64;
        self.get_row(in_bit)
            .iter()
            .map(|&flips| 1.0 - p_to_bias(flips as f64 * norm))
            .sum()
    }

    /// Like `row_diffusion`, but weighting each digest bit by the entropy
    /// of its flip probability.
    pub fn row_entropy(&self, in_bit: usize) -> f64 {
        let norm = 1.0 / self.sample_count as f64;
        self.get_row(in_bit)
            .iter()
            .map(|&flips| p_to_entropy(flips as f64 * norm))
            .sum()
    }

    /// Bias over all (input bit, digest bit) pairings.
    pub fn bias_summary(&self) -> Summary {
        let norm = 1.0 / self.sample_count as f64;
        summarize(self.chart.iter().map(|&flips| p_to_bias(flips as f64 * norm)))
    }

    /// Diffusion over all input bits.
    pub fn diffusion_summary(&self) -> Summary {
        summarize((0..self.input_bit_len).map(|i| self.row_diffusion(i)))
    }

    /// Diffusion entropy over all input bits.
    pub fn entropy_summary(&self) -> Summary {
        summarize((0..self.input_bit_len).map(|i| self.row_entropy(i)))
    }

    pub fn print_report(&self) {
        let bias = self.bias_summary();
        let diffusion = self.diffusion_summary();
        let entropy = self.entropy_summary();

        println!(
            "    Bias:
        Min: {:0.2}
        Avg: {:0.2}
        Max: {:0.2}
    Input Bit Diffusion (digest size = {} bits):
        Min: {:0.1} bits
        Avg: {:0.1} bits
        Max: {:0.1} bits
    Input Bit Diffusion Entropy (digest size = {} bits):
        Min: {:0.1} bits
        Avg: {:0.1} bits
        Max: {:0.1} bits",
            bias.min,
            bias.avg,
            bias.max,
            self.output_bit_len,
            diffusion.min,
            diffusion.avg,
            diffusion.max,
            self.output_bit_len,
            entropy.min,
            entropy.avg,
            entropy.max,
        );
    }

    pub fn write_png<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut pixels = Vec::new();

        for bit in self.chart.iter().copied() {
            let v = (bit * 255 / self.sample_count as u32).min(255) as u8;
            pixels.extend_from_slice(&[v, v, v, 255]);
        }

        png_encode_mini::write_rgba_from_u8(
            &mut File::create(path.as_ref())?,
            &pixels,
            self.output_bit_len as u32,
            self.input_bit_len as u32,
        )?;

        Ok(())
    }
}

fn summarize(values: impl Iterator<Item = f64>) -> Summary {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;

    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        count += 1;
    }

    Summary {
        min,
        avg: sum / count as f64,
        max,
    }
}

/// Computes an avalanche chart for a complete hash function, using a
/// provided input generator.
///
/// - `generate_input`: function that takes a seed and generates an input
///   message.  The result should be deterministic based on the seed.  Note
///   that the seed starts from zero, and simply increments each round.
/// - `hash`: the hash function under measurement, taking a message and
///   producing its 64-bit digest.
/// - `input_size`: size of the generated messages, in bytes.
/// - `rounds`: how many test rounds to perform to produce the estimated
///   chart.
///
/// Each round hashes the generated message once per input bit with that bit
/// flipped, and records which digest bits changed relative to the
/// unmodified message.
pub fn compute_avalanche_chart<F1, F2>(
    generate_input: F1,
    hash: F2,
    input_size: usize,
    rounds: usize,
) -> AvalancheChart
where
    F1: Fn(usize, &mut [u8]),
    F2: Fn(&[u8]) -> u64,
{
    let mut chart = AvalancheChart::new(input_size * 8);

    let mut input = vec![0u8; input_size];
    let mut input_tweaked = vec![0u8; input_size];

    for round in 0..rounds {
        generate_input(round, &mut input[..]);
        let digest = hash(&input[..]);

        for in_bit_idx in 0..(input_size * 8) {
            input_tweaked.copy_from_slice(&input[..]);
            input_tweaked[in_bit_idx / 8] ^= 1 << (in_bit_idx % 8);
            let flipped_bits = digest ^ hash(&input_tweaked[..]);

            for out_bit_idx in 0..chart.output_bit_len {
                let flipped = (flipped_bits >> out_bit_idx) & 1 == 1;
                chart.accumulate(in_bit_idx, out_bit_idx, flipped);
            }
        }

        chart.sample_count += 1;
    }

    chart
}

pub fn p_to_bias(p: f64) -> f64 {
    (p * 2.0 - 1.0).abs()
}

pub fn p_to_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        0.0
    } else {
        let q = 1.0 - p;
        -(p * p.log2()) - (q * q.log2())
    }
}

//-------------------------------------------------------------

/// Generates a random byte stream.
pub fn generate_random(seed: usize, bytes: &mut [u8]) {
    let mut rng = WyRand::new_seed(mix64(seed as u64));
    rng.fill_bytes(bytes);
}

/// Generates a byte stream with all zero bits except one.
pub fn generate_single_1_bit(seed: usize, bytes: &mut [u8]) {
    let bit_idx = seed % (bytes.len() * 8);
    let i = bit_idx / 8;
    let byte = 1 << (bit_idx % 8);
    bytes.fill(0);
    bytes[i] = byte;
}

/// Generates a byte stream with the lowest bits simply counting up as an
/// incrementing integer.
pub fn generate_counting(seed: usize, bytes: &mut [u8]) {
    let counter = &u64::to_le_bytes(seed as u64)[..bytes.len().min(8)];
    bytes.fill(0);
    bytes[..counter.len()].copy_from_slice(counter);
}

/// 64-bit bijective bit mixer.
fn mix64(mut n: u64) -> u64 {
    // Break zero sensitivity.
    n ^= 0x7be355f7c2e736d2;

    // http://zimbry.blogspot.ch/2011/09/better-bit-mixing-improving-on.html
    // (variant "Mix13")
    n ^= n >> 30;
    n = n.wrapping_mul(0xbf58476d1ce4e5b9);
    n ^= n >> 27;
    n = n.wrapping_mul(0x94d049bb133111eb);
    n ^= n >> 31;

    n
}
