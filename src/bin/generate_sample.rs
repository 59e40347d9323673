use chrono::{Days, NaiveDate};
use serde_json::{json, Value};

/// Minimal deterministic PRNG (xorshift64*)
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng {
            state: seed.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn random_date(rng: &mut SimpleRng, first: NaiveDate, span_days: u64) -> NaiveDate {
    first + Days::new(rng.next_u64() % span_days)
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let entities = ["OP-1001", "OP-1002", "OP-1003", "OP-2001", "OP-2002"];
    let processes = ["Llenado", "Sellado", "Etiquetado", "Paletizado"];
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let span_days = 90;

    // Per-entity base times in seconds: water handling is quick, packing slower.
    let water_base = [12.0, 15.5, 9.0, 21.0, 14.0];
    let packing_base = [35.0, 48.0, 28.0, 60.0, 41.0];

    let mut water_addition: Vec<Value> = Vec::new();
    let mut water_suction: Vec<Value> = Vec::new();
    let mut packing: Vec<Value> = Vec::new();

    for _ in 0..400 {
        let e = rng.index(entities.len());
        let date = random_date(&mut rng, first_day, span_days);
        water_addition.push(json!({
            "OnePiece": entities[e],
            "Fecha": date.to_string(),
            "Tiempo Unidad [s]": (rng.gauss(water_base[e], 2.0).max(0.5) * 100.0).round() / 100.0,
        }));
    }

    for _ in 0..400 {
        let e = rng.index(entities.len());
        let date = random_date(&mut rng, first_day, span_days);
        water_suction.push(json!({
            "OnePiece": entities[e],
            "Fecha": date.to_string(),
            "Tiempo Unidad [s]": (rng.gauss(water_base[e] * 0.8, 1.5).max(0.5) * 100.0).round() / 100.0,
        }));
    }

    for _ in 0..800 {
        let e = rng.index(entities.len());
        let p = rng.index(processes.len());
        let date = random_date(&mut rng, first_day, span_days);
        let base = packing_base[e] * (1.0 + p as f64 * 0.25);
        packing.push(json!({
            "OnePiece": entities[e],
            "Proceso": processes[p],
            "Fecha": date.to_string(),
            "Tiempo Unidad [s]": (rng.gauss(base, 4.0).max(1.0) * 100.0).round() / 100.0,
        }));
    }

    let total = water_addition.len() + water_suction.len() + packing.len();
    let workbook = json!({
        "ADICION_AGUA": water_addition,
        "SUCCION_AGUA": water_suction,
        "TIEMPOS_EMPACAR": packing,
    });

    let output_path = "sample_empaque.json";
    let text = serde_json::to_string_pretty(&workbook).expect("Failed to serialize workbook");
    std::fs::write(output_path, text).expect("Failed to write output file");

    println!("Wrote {total} rows across 3 sheets to {output_path}");
}
