use crate::analysis::{LocusAnalyzer, LocusFindings};
use crate::cli::GenotypeArgs;
use crate::graph::GraphAlignment;
use crate::locus::{get_loci, Locus};
use crate::reads::{read_pair_records, PairRecord};
use crate::utils::{create_writer, open_genome_reader, open_text_reader, Karyotype, Result};
use crate::writers::TsvWriter;
use crossbeam_channel::{bounded, Sender};
use rayon::{
    iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{
    collections::{HashMap, HashSet},
    thread,
};

const CHANNEL_BUFFER_SIZE: usize = 2048;

pub fn genotype(args: GenotypeArgs) -> Result<()> {
    let karyotype = Karyotype::new(&args.karyotype)?;
    let params = args.genotyper_params();

    let genome_reader = open_genome_reader(&args.genome_path)?;
    let catalog_reader = open_text_reader(&args.repeats_path)?;
    let loci = load_loci(get_loci(
        catalog_reader,
        &genome_reader,
        &karyotype,
        args.flank_len,
    )?);
    log::info!("Loaded {} loci", loci.len());

    let mut analyzers: Vec<LocusAnalyzer> = loci
        .iter()
        .map(|locus| LocusAnalyzer::new(locus, params))
        .collect();
    dispatch_read_pairs(&args, &mut analyzers)?;

    let mut tsv_writer = create_writer(&args.output_prefix, "tsv", TsvWriter::new)?;
    let (sender_result, receiver_result) = bounded::<(Locus, LocusFindings)>(CHANNEL_BUFFER_SIZE);
    let writer_thread = thread::spawn(move || -> Result<()> {
        for (locus, findings) in &receiver_result {
            tsv_writer.write(&locus, &findings)?;
        }
        tsv_writer.flush()
    });

    log::debug!(
        "Initializing thread pool with {} threads...",
        args.num_threads
    );
    let pool = initialize_thread_pool(args.num_threads)?;
    let genome_wide_depth = args.genome_wide_depth;
    pool.install(|| {
        loci.into_par_iter()
            .zip(analyzers.into_par_iter())
            .for_each_with(&sender_result, |s, (locus, analyzer)| {
                process_locus(locus, &analyzer, genome_wide_depth, s)
            });
    });

    // Clean-up
    drop(sender_result);
    writer_thread
        .join()
        .map_err(|_| "Writer thread panicked".to_string())??;
    log::trace!("Writer thread finished");

    Ok(())
}

/// Keeps the valid catalog entries with unique ids
fn load_loci(entries: Vec<Result<Locus>>) -> Vec<Locus> {
    let mut seen_ids = HashSet::new();
    let mut loci = Vec::new();
    for entry in entries {
        match entry {
            Ok(locus) => {
                if !seen_ids.insert(locus.id.clone()) {
                    log::warn!("Skipping duplicate locus {}", locus.id);
                    continue;
                }
                loci.push(locus);
            }
            Err(err) => log::warn!("{}", err),
        }
    }
    loci
}

fn dispatch_read_pairs(args: &GenotypeArgs, analyzers: &mut [LocusAnalyzer]) -> Result<()> {
    let index_of_locus: HashMap<String, usize> = analyzers
        .iter()
        .enumerate()
        .map(|(index, analyzer)| (analyzer.locus_id().to_string(), index))
        .collect();

    let alignments_reader = open_text_reader(&args.alignments_path)?;
    let mut num_records = 0;
    for record in read_pair_records(alignments_reader) {
        let record = record?;
        num_records += 1;

        let Some(&index) = index_of_locus.get(&record.locus_id) else {
            log::debug!("Skipping read pair of unknown locus {}", record.locus_id);
            continue;
        };
        if let Err(err) = process_record(&mut analyzers[index], &record) {
            log::warn!(
                "Skipping read pair {}/{} of {}: {}",
                record.read.id,
                record.mate.id,
                record.locus_id,
                err
            );
        }
    }
    log::info!("Processed {} read pairs", num_records);

    Ok(())
}

fn process_record(analyzer: &mut LocusAnalyzer, record: &PairRecord) -> Result<()> {
    let decode = |encoding: &Option<String>| {
        encoding
            .as_deref()
            .map(|encoding| GraphAlignment::from_string(encoding, analyzer.graph()))
            .transpose()
    };
    let read_alignment = decode(&record.read_alignment)?;
    let mate_alignment = decode(&record.mate_alignment)?;

    analyzer.process_mates(
        &record.read,
        read_alignment.as_ref(),
        &record.mate,
        mate_alignment.as_ref(),
        record.region_type,
    )
}

fn process_locus(
    locus: Locus,
    analyzer: &LocusAnalyzer,
    genome_wide_depth: Option<f64>,
    sender_result: &Sender<(Locus, LocusFindings)>,
) {
    let findings = analyzer.analyze(genome_wide_depth);
    if let Err(e) = sender_result.send((locus, findings)) {
        log::error!("Failed to send locus result to writer thread: {}", e);
    }
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("repeatgt-{}", i))
        .start_handler(|_thread_index| {
            log::trace!("Initialized thread {:?}", std::thread::current().id());
        })
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::GenotyperParams;
    use crate::reads::RegionType;
    use crate::utils::{GenomicRegion, Ploidy};

    fn make_locus(id: &str) -> Locus {
        Locus::from_parts(
            id.to_string(),
            GenomicRegion::new("chr1", 100, 130).unwrap(),
            "ATTCGATTCGATTCG".to_string(),
            "GTCGATGTCGATGTC".to_string(),
            "(CAG)*".to_string(),
            None,
            Ploidy::Two,
        )
        .unwrap()
    }

    #[test]
    fn test_load_loci_skips_errors_and_duplicates() {
        let entries = vec![
            Ok(make_locus("A")),
            Err("Error at BED line 2: ID field missing".to_string()),
            Ok(make_locus("B")),
            Ok(make_locus("A")),
        ];
        let ids: Vec<String> = load_loci(entries).into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_process_record_decodes_alignments() {
        let locus = make_locus("A");
        let mut analyzer = LocusAnalyzer::new(&locus, GenotyperParams::default());
        let spanning = "3:0[12M]1[3M]1[3M]2[12M]";
        let line = format!(
            "A\ttarget\tr/1\t{}\t{}\tr/2\t{}\t{}",
            "N".repeat(30),
            spanning,
            "N".repeat(30),
            spanning
        );
        let record = PairRecord::from_line(&line).unwrap();
        assert_eq!(record.region_type, RegionType::Target);
        process_record(&mut analyzer, &record).unwrap();

        let findings = analyzer.analyze(None);
        assert_eq!(findings.findings[0].1.counts_of_spanning_reads.count_of(2), 2);

        let bad_line = "A\ttarget\tr/1\tNNN\t0:5[3M]\tr/2\tNNN\t*";
        let bad_record = PairRecord::from_line(bad_line).unwrap();
        assert!(process_record(&mut analyzer, &bad_record).is_err());
    }
}
