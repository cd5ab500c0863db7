use crate::utils::{Ploidy, Result};
use std::{collections::HashMap, fs, io::BufRead};

/// Expected number of copies of each chromosome in the sample
#[derive(Debug, PartialEq, Clone)]
pub enum Karyotype {
    Female,
    Male,
    Custom(HashMap<String, Ploidy>),
}

impl Karyotype {
    /// Accepts `XX`, `XY`, or the path of a `chrom ploidy` file
    pub fn new(encoding: &str) -> Result<Self> {
        match encoding {
            "XX" => Ok(Karyotype::Female),
            "XY" => Ok(Karyotype::Male),
            path => {
                let file = fs::File::open(path).map_err(|e| format!("File {}: {}", path, e))?;
                Self::from_reader(std::io::BufReader::new(file))
            }
        }
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut ploidies = HashMap::new();

        for (line_index, line) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line.map_err(|e| format!("Error reading line {}: {}", line_number, e))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (chrom, ploidy) = match line.split_whitespace().collect::<Vec<_>>()[..] {
                [chrom, ploidy] => (chrom, ploidy),
                _ => {
                    return Err(format!(
                        "Expected 'chrom ploidy' at line {}: {}",
                        line_number, line
                    ))
                }
            };
            let ploidy = ploidy
                .parse::<Ploidy>()
                .map_err(|e| format!("Invalid ploidy at line {}, {}", line_number, e))?;

            if ploidies.insert(chrom.to_string(), ploidy).is_some() {
                return Err(format!(
                    "Duplicate chromosome entry at line {}: {}",
                    line_number, chrom
                ));
            }
        }

        Ok(Karyotype::Custom(ploidies))
    }

    pub fn ploidy_of(&self, chrom: &str) -> Result<Ploidy> {
        let is_x = matches!(chrom, "X" | "chrX");
        let is_y = matches!(chrom, "Y" | "chrY");
        match self {
            Karyotype::Female if is_y => Ok(Ploidy::Zero),
            Karyotype::Male if is_x || is_y => Ok(Ploidy::One),
            Karyotype::Female | Karyotype::Male => Ok(Ploidy::Two),
            Karyotype::Custom(ploidies) => ploidies
                .get(chrom)
                .copied()
                .ok_or_else(|| format!("Ploidy was not specified for chromosome: {}", chrom)),
        }
    }
}
