use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// A stretch of the trip spent in one state, with its rough centre.
struct Leg {
    state: &'static str,
    lat: f64,
    lon: f64,
    records: usize,
}

/// Neighbouring state a phone near the border may briefly attach to.
const BORDER_STATES: [(&str, &str); 3] = [("NY", "NJ"), ("NJ", "PA"), ("PA", "OH")];

/// Format the processing service parses timestamps with.
const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M";

fn main() {
    let mut rng = SimpleRng::new(42);

    let legs = [
        Leg { state: "NY", lat: 40.71, lon: -74.00, records: 120 },
        Leg { state: "NJ", lat: 40.22, lon: -74.76, records: 90 },
        Leg { state: "PA", lat: 40.27, lon: -76.88, records: 110 },
        Leg { state: "OH", lat: 39.96, lon: -82.99, records: 80 },
    ];

    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 1, 5)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid start timestamp");
    // Eastern time, no DST in January.
    let utc_offset = Duration::hours(5);

    let output_path = "sample_records.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["UTCDateTime", "LocalDateTime", "Latitude", "Longitude", "State"])
        .expect("Failed to write header");

    let mut t = start;
    let mut written = 0usize;
    let mut jumps = 0usize;

    for leg in &legs {
        for _ in 0..leg.records {
            t += Duration::minutes(1 + rng.below(4) as i64);

            // ~4 % of records land on a tower across the border.
            let state = match BORDER_STATES.iter().find(|(home, _)| *home == leg.state) {
                Some((_, neighbour)) if rng.next_f64() < 0.04 => {
                    jumps += 1;
                    *neighbour
                }
                _ => leg.state,
            };
            let lat = leg.lat + (rng.next_f64() - 0.5) * 0.2;
            let lon = leg.lon + (rng.next_f64() - 0.5) * 0.2;

            writer
                .write_record([
                    (t + utc_offset).format(TIMESTAMP_FORMAT).to_string(),
                    t.format(TIMESTAMP_FORMAT).to_string(),
                    format!("{lat:.5}"),
                    format!("{lon:.5}"),
                    state.to_string(),
                ])
                .expect("Failed to write record");
            written += 1;
        }
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {written} records ({jumps} cross-border pings) to {output_path}");
}
