use super::genotyper::{GenotypeModel, ModelParams, RepeatEvidence};
use super::{CountTable, RepeatGenotype, TrSize};
use crate::utils::Ploidy;
use itertools::Itertools;
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};

/// Ratio between the probabilities of successive stutter distances
const STUTTER_DECAY: f64 = 0.5;
const MIN_PROB: f64 = 1e-12;
const MIN_SPANNING_RATE: f64 = 0.01;
const MIN_INREPEAT_RATE: f64 = 0.5;
const CI_QUANTILES: (f64, f64) = (0.025, 0.975);

/// Read-count likelihood model
///
/// Each read is explained as an equal mixture over the haplotypes of a genotype:
///
/// * spanning reads report the allele size up to geometric stutter and cannot
///   come from alleles too long to be spanned;
/// * flanking reads report any size up to the allele size (or the read length);
/// * in-repeat reads need an allele at least as long as themselves.
///
/// The number of spanning reads is modelled as Poisson with a rate that shrinks
/// as alleles approach the read length. Alleles at the read length are then
/// extended from the number of in-repeat reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadCountModel;

impl GenotypeModel for ReadCountModel {
    fn score(
        &self,
        candidate_sizes: &[u32],
        evidence: &RepeatEvidence,
        params: &ModelParams,
    ) -> Option<RepeatGenotype> {
        let sizes = candidate_sizes.iter().copied().sorted().dedup().collect_vec();
        let genotypes: Vec<Vec<u32>> = match params.ploidy {
            Ploidy::Two => sizes
                .iter()
                .enumerate()
                .flat_map(|(index, &short)| sizes[index..].iter().map(move |&long| vec![short, long]))
                .collect(),
            Ploidy::One | Ploidy::Zero => sizes.iter().map(|&size| vec![size]).collect(),
        };

        let mut best: Option<(&[u32], f64)> = None;
        for alleles in &genotypes {
            let ll = log_likelihood(alleles, evidence, params);
            log::trace!("Genotype {:?} has log-likelihood {:.3}", alleles, ll);
            match best {
                Some((_, best_ll)) if ll <= best_ll => {}
                _ => best = Some((alleles.as_slice(), ll)),
            }
        }

        let (alleles, _) = best?;
        Some(build_genotype(alleles, evidence, params))
    }
}

fn log_likelihood(alleles: &[u32], evidence: &RepeatEvidence, params: &ModelParams) -> f64 {
    let cap = params.max_units_in_read.max(1);
    let p = params.prop_correct_molecules;
    let mixture = |prob: &dyn Fn(u32) -> f64| {
        let total: f64 = alleles.iter().map(|&allele| prob(allele)).sum();
        (total / alleles.len() as f64).max(MIN_PROB).ln()
    };

    let mut ll = 0.0;
    for (size, count) in evidence.spanning.iter() {
        ll += count as f64 * mixture(&|allele| spanning_prob(size, allele, cap, p));
    }
    for (size, count) in evidence.flanking.iter() {
        ll += count as f64 * mixture(&|allele| flanking_prob(size, allele, cap, p));
    }
    for (size, count) in evidence.inrepeat.iter() {
        ll += count as f64 * mixture(&|allele| inrepeat_prob(size, allele, p));
    }
    let num_pair_reads = 2 * evidence.num_inrepeat_read_pairs;
    if num_pair_reads > 0 {
        ll += num_pair_reads as f64 * mixture(&|allele| inrepeat_prob(cap, allele, p));
    }

    let spanning_rate: f64 = alleles
        .iter()
        .map(|&allele| params.haplotype_depth * cap.saturating_sub(allele) as f64 / cap as f64)
        .sum();
    ll + poisson_ln_pmf(evidence.spanning.total(), spanning_rate.max(MIN_SPANNING_RATE))
}

/// Probability of a stutter error of the given (non-zero) distance
fn error_prob(distance: u32, p: f64) -> f64 {
    (1.0 - p) * (1.0 - STUTTER_DECAY) * STUTTER_DECAY.powi(distance.max(1) as i32 - 1)
}

fn spanning_prob(size: u32, allele: u32, cap: u32, p: f64) -> f64 {
    if allele >= cap {
        error_prob(size.abs_diff(allele), p)
    } else if size == allele {
        p
    } else {
        error_prob(size.abs_diff(allele), p) / 2.0
    }
}

fn flanking_prob(size: u32, allele: u32, cap: u32, p: f64) -> f64 {
    let reach = allele.min(cap);
    if size <= reach {
        p / (reach + 1) as f64
    } else {
        error_prob(size - reach, p)
    }
}

fn inrepeat_prob(size: u32, allele: u32, p: f64) -> f64 {
    if allele >= size {
        p
    } else {
        error_prob(size - allele, p)
    }
}

fn build_genotype(alleles: &[u32], evidence: &RepeatEvidence, params: &ModelParams) -> RepeatGenotype {
    let cap = params.max_units_in_read.max(1);
    let num_expanded = alleles.iter().filter(|&&allele| allele >= cap).count().max(1);
    let num_inrepeat_reads =
        evidence.inrepeat.total() as f64 + 2.0 * evidence.num_inrepeat_read_pairs as f64;
    let reads_per_expanded_allele = num_inrepeat_reads / num_expanded as f64;

    alleles
        .iter()
        .map(|&allele| {
            if allele >= cap {
                estimate_expanded_size(cap, reads_per_expanded_allele, params.haplotype_depth)
            } else {
                TrSize::new(allele, spanning_ci(allele, alleles, evidence.spanning))
            }
        })
        .collect()
}

/// Range of spanning sizes closer to this allele than to the other one
fn spanning_ci(allele: u32, alleles: &[u32], spanning: &CountTable) -> (u32, u32) {
    let nearest_allele = |size: u32| {
        alleles
            .iter()
            .copied()
            .min_by_key(|other| other.abs_diff(size))
            .unwrap_or(allele)
    };

    spanning
        .iter()
        .map(|(size, _)| size)
        .filter(|&size| nearest_allele(size) == allele)
        .fold((allele, allele), |(lo, hi), size| (lo.min(size), hi.max(size)))
}

/// Size of an allele longer than the read length from the in-repeat read depth
fn estimate_expanded_size(cap: u32, num_reads: f64, haplotype_depth: f64) -> TrSize {
    if haplotype_depth <= 0.0 {
        return TrSize::new(cap, (cap, cap));
    }

    let units_per_read = cap as f64 / haplotype_depth;
    let to_units = |reads: f64| {
        let extension = (reads * units_per_read).round().min(u32::MAX as f64) as u32;
        cap.saturating_add(extension)
    };

    let rate = num_reads.max(MIN_INREPEAT_RATE);
    let lower = poisson_quantile(rate, CI_QUANTILES.0) as f64;
    let upper = poisson_quantile(rate, CI_QUANTILES.1) as f64;

    let size = to_units(num_reads);
    TrSize::new(size, (to_units(lower).min(size), to_units(upper).max(size)))
}

fn poisson_ln_pmf(count: u32, rate: f64) -> f64 {
    match Poisson::new(rate) {
        Ok(dist) => dist.ln_pmf(count as u64),
        Err(_) => MIN_PROB.ln(),
    }
}

fn poisson_quantile(rate: f64, prob: f64) -> u64 {
    match Poisson::new(rate) {
        Ok(dist) => dist.inverse_cdf(prob),
        Err(_) => 0,
    }
}
