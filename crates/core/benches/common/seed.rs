use std::env;

pub fn bench_seed() -> u64 {
    env::var("FIXSOM_BENCH_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0x5EED_F1C5)
}
