use crate::graph::Graph;
use crate::utils::{GenomicRegion, Karyotype, Ploidy, Result};
use rust_htslib::faidx;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read as ioRead},
};

/// A catalog entry together with its locus graph
#[derive(Debug, Clone)]
pub struct Locus {
    pub id: String,
    pub region: GenomicRegion,
    pub left_flank: String,
    pub right_flank: String,
    pub structure: String,
    pub rare_motif: Option<String>,
    pub ploidy: Ploidy,
    pub graph: Graph,
}

impl Locus {
    /// Parses a catalog line `chrom start end ID=..;STRUC=..[;RARE=..]`
    pub fn new(
        genome_reader: &faidx::Reader,
        chrom_lookup: &HashMap<String, u32>,
        line: &str,
        flank_len: usize,
        karyotype: &Karyotype,
    ) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 4;
        let split_line: Vec<&str> = line.split_whitespace().collect();
        let [chrom, start, end, info_fields] = split_line[..] else {
            return Err(format!(
                "Expected {} fields in the format 'chrom start end info', found {}: {}",
                EXPECTED_FIELD_COUNT,
                split_line.len(),
                line
            ));
        };

        let region = GenomicRegion::parse(chrom, start, end)?;
        check_region_bounds(&region, flank_len, chrom_lookup)?;

        let ploidy = karyotype.ploidy_of(chrom)?;
        let fields = decode_fields(info_fields)?;
        let get_field = |key: &str| {
            fields
                .get(key)
                .cloned()
                .ok_or_else(|| format!("{} field missing", key))
        };

        let id = get_field("ID")?;
        let structure = get_field("STRUC")?;
        let rare_motif = fields.get("RARE").cloned();

        let (left_flank, right_flank) = get_flanks(genome_reader, &region, flank_len)?;

        Self::from_parts(
            id,
            region,
            left_flank,
            right_flank,
            structure,
            rare_motif,
            ploidy,
        )
    }

    pub fn from_parts(
        id: String,
        region: GenomicRegion,
        left_flank: String,
        right_flank: String,
        structure: String,
        rare_motif: Option<String>,
        ploidy: Ploidy,
    ) -> Result<Self> {
        let graph = Graph::from_structure(&left_flank, &structure, &right_flank)?;

        let rare_motif = rare_motif.map(|motif| motif.to_uppercase());
        if let Some(motif) = &rare_motif {
            let num_matching = graph
                .repeat_nodes()
                .into_iter()
                .filter(|&node_id| graph.node_seq(node_id) == motif)
                .count();
            match num_matching {
                0 => {
                    return Err(format!(
                        "Rare motif {} does not match any repeat of {}",
                        motif, structure
                    ))
                }
                1 => {}
                _ => {
                    return Err(format!(
                        "Locus {} is not permitted to have more than one rare repeat ({} repeats of {})",
                        id, num_matching, motif
                    ))
                }
            }
        }

        Ok(Locus {
            id,
            region,
            left_flank,
            right_flank,
            structure,
            rare_motif,
            ploidy,
            graph,
        })
    }

    /// Loci with rare repeats rely on genome-wide depth rather than local coverage
    pub fn requires_genome_wide_depth(&self) -> bool {
        self.rare_motif.is_some()
    }
}

pub fn create_chrom_lookup(reader: &faidx::Reader) -> Result<HashMap<String, u32>> {
    let num_seqs = reader.n_seqs() as usize;
    let mut map = HashMap::with_capacity(num_seqs);
    for i in 0..num_seqs {
        let name = reader.seq_name(i as i32).map_err(|e| e.to_string())?;
        let len = reader.fetch_seq_len(&name);
        let len_u32 = u32::try_from(len).map_err(|_| {
            format!(
                "Sequence length for '{}' is negative and cannot be converted to u32",
                &name
            )
        })?;
        map.insert(name, len_u32);
    }
    Ok(map)
}

/// Reads all catalog loci; malformed entries come back as errors tagged with their line
pub fn get_loci(
    catalog_reader: BufReader<Box<dyn ioRead>>,
    genome_reader: &faidx::Reader,
    karyotype: &Karyotype,
    flank_len: usize,
) -> Result<Vec<Result<Locus>>> {
    let chrom_lookup = create_chrom_lookup(genome_reader)?;

    let mut loci = Vec::new();
    for (line_number, result_line) in catalog_reader.lines().enumerate() {
        let line = result_line.map_err(|e| format!("Error at BED line {}: {}", line_number + 1, e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        loci.push(
            Locus::new(genome_reader, &chrom_lookup, &line, flank_len, karyotype)
                .map_err(|e| format!("Error at BED line {}: {}", line_number + 1, e)),
        );
    }
    Ok(loci)
}

fn get_flanks(
    genome: &faidx::Reader,
    region: &GenomicRegion,
    flank_len: usize,
) -> Result<(String, String)> {
    let fetch_seq = |start: usize, end: usize| {
        genome
            .fetch_seq_string(&region.contig, start, end)
            .map_err(|e| {
                format!(
                    "Error fetching sequence for region {}:{}-{}: {}",
                    &region.contig, start, end, e
                )
            })
            .map(|seq| seq.to_uppercase())
    };

    let left_flank = fetch_seq(region.start as usize - flank_len, region.start as usize - 1)?;
    let right_flank = fetch_seq(region.end as usize, region.end as usize + flank_len - 1)?;

    Ok((left_flank, right_flank))
}

fn decode_fields(info_fields: &str) -> Result<HashMap<&str, String>> {
    let mut fields = HashMap::new();
    for field_encoding in info_fields.split(';') {
        let (name, value) = decode_info_field(field_encoding)?;
        if fields.insert(name, value.to_string()).is_some() {
            return Err(format!("Duplicate field name: '{}'", name));
        }
    }
    Ok(fields)
}

fn decode_info_field(encoding: &str) -> Result<(&str, &str)> {
    match encoding.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok((name, value)),
        _ => Err(format!(
            "Field must be in 'name=value' format: '{}'",
            encoding
        )),
    }
}

fn check_region_bounds(
    region: &GenomicRegion,
    flank_len: usize,
    chrom_lookup: &HashMap<String, u32>,
) -> Result<()> {
    let chrom_length = *chrom_lookup.get(&region.contig).ok_or_else(|| {
        format!(
            "FASTA reference does not contain chromosome '{}' in BED file",
            &region.contig
        )
    })?;

    if flank_len == 0 {
        return Err("Flank length must be positive".to_string());
    }
    let flank_len_u32 = u32::try_from(flank_len)
        .map_err(|_| format!("Flank length {} is too large", flank_len))?;

    if region.start < flank_len_u32 {
        return Err(format!(
            "Region start '{}' with flank length '{}' underflows for chromosome '{}'.",
            region.start, flank_len, &region.contig
        ));
    }

    let adjusted_end = region.end.checked_add(flank_len_u32).ok_or_else(|| {
        format!(
            "Region end '{}' with flank length '{}' overflows for chromosome '{}'.",
            region.end, flank_len, &region.contig
        )
    })?;

    if adjusted_end > chrom_length {
        return Err(format!(
            "Region end '{}' with flank length '{}' exceeds chromosome '{}' bounds (0..{}).",
            adjusted_end, flank_len, &region.contig, chrom_length
        ));
    }

    Ok(())
}
