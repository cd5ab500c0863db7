use crate::utils::reverse_complement;

const LOW_QUALITY_WEIGHT: f64 = 0.5;

/// Scores how well a read matches a perfect repeat of a motif
///
/// Every rotation of the motif and of its reverse complement is tried. Each
/// base scores +1 on a match and -1 on a mismatch; lowercase (low quality)
/// bases count half. The best score is normalized by the total weight.
#[derive(Debug, Clone)]
pub struct WeightedPurityCalculator {
    patterns: Vec<Vec<u8>>,
}

impl WeightedPurityCalculator {
    pub fn new(motif: &str) -> Self {
        let motif = motif.to_ascii_uppercase();
        let mut patterns = Vec::new();
        for strand in [motif.clone(), reverse_complement(&motif)] {
            let bases = strand.as_bytes();
            for shift in 0..bases.len() {
                let rotation = [&bases[shift..], &bases[..shift]].concat();
                if !patterns.contains(&rotation) {
                    patterns.push(rotation);
                }
            }
        }
        Self { patterns }
    }

    pub fn score(&self, seq: &str) -> f64 {
        self.patterns
            .iter()
            .map(|pattern| score_against(pattern, seq.as_bytes()))
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

fn score_against(pattern: &[u8], seq: &[u8]) -> f64 {
    let (score, total_weight) = seq
        .iter()
        .zip(pattern.iter().cycle())
        .fold((0.0, 0.0), |(score, total), (base, expected)| {
            let weight = if base.is_ascii_lowercase() {
                LOW_QUALITY_WEIGHT
            } else {
                1.0
            };
            let matches = base.to_ascii_uppercase() == *expected;
            (score + if matches { weight } else { -weight }, total + weight)
        });

    if total_weight > 0.0 {
        score / total_weight
    } else {
        0.0
    }
}
