mod pair_record;
mod read;

pub use pair_record::{read_pair_records, PairRecord, RegionType};
pub use read::Read;
