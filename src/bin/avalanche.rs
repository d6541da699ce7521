use lib::{
    avalanche::{
        compute_avalanche_chart, generate_counting, generate_random, generate_single_1_bit,
    },
    xxhash64::XxHash64,
};

struct Scenario<'a> {
    name: &'a str,
    seed: u64,
    input_size: usize, // In bytes.
}

// Message lengths are chosen so every ingestion/finalization path gets
// exercised: each tail pass on its own, the exact block boundary, and
// multi-block messages with a ragged tail.
const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "3-byte tail",
        seed: 0,
        input_size: 3,
    },
    Scenario {
        name: "11-byte tail",
        seed: 0,
        input_size: 11,
    },
    Scenario {
        name: "26-byte tail",
        seed: 0,
        input_size: 26,
    },
    Scenario {
        name: "single block",
        seed: 0,
        input_size: 32,
    },
    Scenario {
        name: "two blocks, ragged tail",
        seed: 0,
        input_size: 77,
    },
    Scenario {
        name: "seeded, 26-byte tail",
        seed: 0x5bd1e995,
        input_size: 26,
    },
];

struct BitPattern<'a> {
    name: &'a str,
    gen_function: &'a dyn Fn(usize, &mut [u8]),

    /// Number of rounds to run the pattern with. Zero is treated specially,
    /// and means to use the bit width of the input.
    rounds: usize,
}

const PATTERNS: &[BitPattern] = &[
    BitPattern {
        name: "random",
        gen_function: &generate_random,
        rounds: 1 << 12,
    },
    BitPattern {
        name: "counting",
        gen_function: &generate_counting,
        rounds: 1 << 12,
    },
    BitPattern {
        name: "single-bit",
        gen_function: &generate_single_1_bit,

        // NOTE: because this test has a small, fixed number of rounds by its
        // nature, the generated statistics should be interpreted a little
        // differently. In particular, even a very good hash is unlikely to
        // achieve "perfect" avalanche by this measure, purely because it's
        // impossible to collect enough samples to reduce variance enough.
        rounds: 0,
    },
];

fn main() {
    let mut write_pngs = false;
    let mut name_filters = Vec::new();

    for arg in std::env::args().skip(1) {
        if !arg.starts_with("-") {
            name_filters.push(arg.to_lowercase());
            continue;
        }

        if arg == "--png" {
            write_pngs = true;
            continue;
        }
    }

    for scenario in SCENARIOS.iter() {
        if !name_filters.is_empty() {
            let lower_name = scenario.name.to_lowercase();

            if !name_filters
                .iter()
                .any(|filter| lower_name.contains(filter))
            {
                continue;
            }
        }

        println!("\n================================");
        println!(
            "{} ({} bytes, seed {:#x})",
            scenario.name, scenario.input_size, scenario.seed
        );
        for pattern in PATTERNS.iter() {
            println!("\nInput bit pattern: {}", pattern.name);
            let chart = compute_avalanche_chart(
                pattern.gen_function,
                |input| XxHash64::hash_with_seed(input, scenario.seed),
                scenario.input_size,
                if pattern.rounds == 0 {
                    scenario.input_size * 8
                } else {
                    pattern.rounds
                },
            );
            chart.print_report();
            if write_pngs {
                chart
                    .write_png(&format!("{} - {}.png", scenario.name, pattern.name))
                    .unwrap();
            }
        }
    }
}
