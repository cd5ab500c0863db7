use arrayvec::ArrayVec;
use itertools::Itertools;

/// Allele size in repeat units with its confidence interval
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TrSize {
    pub size: u32,
    pub ci: (u32, u32),
}

impl TrSize {
    pub fn new(size: u32, ci: (u32, u32)) -> TrSize {
        TrSize { size, ci }
    }
}

/// One allele per haplotype in ascending size order
pub type RepeatGenotype = ArrayVec<TrSize, 2>;

/// Renders a genotype as `5/8` with intervals `5-5/7-9`
pub fn encode_genotype(genotype: &RepeatGenotype) -> (String, String) {
    let sizes = genotype.iter().map(|allele| allele.size).join("/");
    let cis = genotype
        .iter()
        .map(|allele| format!("{}-{}", allele.ci.0, allele.ci.1))
        .join("/");
    (sizes, cis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_genotype() {
        let genotype = RepeatGenotype::from([TrSize::new(5, (5, 5)), TrSize::new(8, (7, 9))]);
        assert_eq!(
            encode_genotype(&genotype),
            ("5/8".to_string(), "5-5/7-9".to_string())
        );
    }
}
