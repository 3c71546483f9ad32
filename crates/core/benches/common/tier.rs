use std::env;
use std::time::Duration;

use criterion::BenchmarkGroup;
use criterion::measurement::Measurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchTier {
    Quick,
    Full,
}

impl BenchTier {
    pub fn from_env() -> Self {
        match env::var("FIXSOM_BENCH_TIER").as_deref() {
            Ok("full") => Self::Full,
            _ => Self::Quick,
        }
    }

    /// Synthetic page sizes as (columns, lines per column).
    pub fn layouts(self) -> &'static [(usize, usize)] {
        match self {
            Self::Quick => &[(1, 40), (3, 40)],
            Self::Full => &[(1, 40), (3, 40), (4, 120)],
        }
    }

    pub fn configure<M: Measurement>(self, group: &mut BenchmarkGroup<'_, M>) {
        let (sample_size, measurement) = match self {
            Self::Quick => (20, Duration::from_secs(3)),
            Self::Full => (30, Duration::from_secs(5)),
        };
        group.sample_size(sample_size);
        group.measurement_time(measurement);
    }
}
