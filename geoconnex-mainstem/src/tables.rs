//! Flowline and mainstem lookup tables.
//!
//! Both tables are exact-match `FxHashMap<i64, i64>`s loaded once from flat
//! tabular reference data and never written afterwards.
//!
//! CSV sources:
//!
//! | Table | Key column | Value column |
//! |-------|------------|--------------|
//! | flowlines | `COMID` | `LevelPathI` |
//! | mainstems | `lp_mainstem` | `ref_mainstem_id` |
//!
//! Header matching is case-insensitive and also accepts the prefixed names
//! of the joined reference file (`Flowline_COMID`,
//! `Mainstem_Metadata_lp_mainstem`, ...). Values may be written as integers
//! or zero-fraction floats; empty or `NA` cells skip the row.

use crate::error::{ReferenceError, Result};
use csv::StringRecord;
use geoconnex_spatial::parse_identifier_str;
use rustc_hash::FxHashMap;
use std::io::Read;

const FLOWLINE_KEYS: &[&str] = &["comid", "flowline_comid", "featureid"];
const FLOWLINE_VALUES: &[&str] = &["levelpathi", "flowline_levelpathi", "terminal_path_id"];
const MAINSTEM_KEYS: &[&str] = &["lp_mainstem", "mainstem_metadata_lp_mainstem", "levelpath_id"];
const MAINSTEM_VALUES: &[&str] = &[
    "ref_mainstem_id",
    "mainstem_metadata_ref_mainstem_id",
    "reference_mainstem_id",
];

/// Row accounting for one table load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Data rows read.
    pub rows: u64,

    /// Entries inserted.
    pub loaded: u64,

    /// Rows with a missing or non-integer key/value.
    pub skipped: u64,

    /// Rows whose key was already present with a different value.
    pub conflicts: u64,
}

/// Catchment id (COMID) → terminal path (level path) id.
#[derive(Debug, Clone, Default)]
pub struct FlowlineTable {
    terminal_paths: FxHashMap<i64, i64>,
}

impl FlowlineTable {
    /// Build from `(comid, terminal_path_id)` pairs; the first pair per key wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut terminal_paths = FxHashMap::default();
        for (comid, tp) in pairs {
            terminal_paths.entry(comid).or_insert(tp);
        }
        Self { terminal_paths }
    }

    /// Load from CSV with `COMID` and `LevelPathI` columns.
    pub fn from_csv<R: Read>(reader: R) -> Result<(Self, TableStats)> {
        let (terminal_paths, stats) = read_pairs(
            reader,
            "flowline",
            ("COMID", FLOWLINE_KEYS),
            ("LevelPathI", FLOWLINE_VALUES),
        )?;
        Ok((Self { terminal_paths }, stats))
    }

    /// Overlay `other` on this table; `other` wins on shared keys.
    pub fn merge(&mut self, other: FlowlineTable) {
        self.terminal_paths.extend(other.terminal_paths);
    }

    /// Terminal path of a catchment, if it has a flowline.
    pub fn lookup_terminal_path(&self, catchment_id: i64) -> Option<i64> {
        self.terminal_paths.get(&catchment_id).copied()
    }

    pub fn len(&self) -> usize {
        self.terminal_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminal_paths.is_empty()
    }
}

/// Level path id → reference mainstem id.
#[derive(Debug, Clone, Default)]
pub struct MainstemTable {
    mainstems: FxHashMap<i64, i64>,
}

impl MainstemTable {
    /// Build from `(levelpath_id, reference_mainstem_id)` pairs; the first
    /// pair per key wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut mainstems = FxHashMap::default();
        for (lp, ms) in pairs {
            mainstems.entry(lp).or_insert(ms);
        }
        Self { mainstems }
    }

    /// Load from CSV with `lp_mainstem` and `ref_mainstem_id` columns.
    pub fn from_csv<R: Read>(reader: R) -> Result<(Self, TableStats)> {
        let (mainstems, stats) = read_pairs(
            reader,
            "mainstem",
            ("lp_mainstem", MAINSTEM_KEYS),
            ("ref_mainstem_id", MAINSTEM_VALUES),
        )?;
        Ok((Self { mainstems }, stats))
    }

    /// Reference mainstem for a terminal path.
    pub fn lookup_mainstem(&self, terminal_path_id: i64) -> Option<i64> {
        self.mainstems.get(&terminal_path_id).copied()
    }

    pub fn len(&self) -> usize {
        self.mainstems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mainstems.is_empty()
    }
}

fn find_column(headers: &StringRecord, accepted: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().trim_start_matches('\u{feff}');
        accepted.iter().any(|a| h.eq_ignore_ascii_case(a))
    })
}

fn read_pairs<R: Read>(
    reader: R,
    table: &'static str,
    (key_name, key_cols): (&'static str, &[&str]),
    (value_name, value_cols): (&'static str, &[&str]),
) -> Result<(FxHashMap<i64, i64>, TableStats)> {
    let csv_err = |source| ReferenceError::Csv { table, source };

    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let key_idx = find_column(&headers, key_cols).ok_or(ReferenceError::MissingColumn {
        table,
        column: key_name,
    })?;
    let value_idx = find_column(&headers, value_cols).ok_or(ReferenceError::MissingColumn {
        table,
        column: value_name,
    })?;

    let mut map = FxHashMap::default();
    let mut stats = TableStats::default();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).map_err(csv_err)? {
        stats.rows += 1;
        let key = record.get(key_idx).and_then(parse_identifier_str);
        let value = record.get(value_idx).and_then(parse_identifier_str);
        let (Some(key), Some(value)) = (key, value) else {
            stats.skipped += 1;
            continue;
        };
        match map.get(&key) {
            Some(&existing) => {
                if existing != value {
                    stats.conflicts += 1;
                }
            }
            None => {
                map.insert(key, value);
                stats.loaded += 1;
            }
        }
    }

    if stats.conflicts > 0 {
        tracing::debug!(
            table,
            conflicts = stats.conflicts,
            "duplicate keys with differing values; kept first occurrence"
        );
    }

    Ok((map, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainstem_csv() {
        let csv = "\
lp_mainstem,ref_mainstem_id,uri
54321,77,https://geoconnex.us/ref/mainstems/77
54322.0,78.0,
54323,NA,
,79,
54321,99,
54321,77,
";
        let (table, stats) = MainstemTable::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.lookup_mainstem(54321), Some(77));
        assert_eq!(table.lookup_mainstem(54322), Some(78));
        assert_eq!(table.lookup_mainstem(54323), None);
        assert_eq!(table.len(), 2);
        assert_eq!(
            stats,
            TableStats {
                rows: 6,
                loaded: 2,
                skipped: 2,
                conflicts: 1,
            }
        );
    }

    #[test]
    fn test_flowline_csv_prefixed_headers() {
        let csv = "Flowline_COMID,Flowline_LevelPathI\n1000403,54321\n1000404,54321\n";
        let (table, stats) = FlowlineTable::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.lookup_terminal_path(1000403), Some(54321));
        assert_eq!(table.lookup_terminal_path(1000404), Some(54321));
        assert_eq!(table.lookup_terminal_path(1), None);
        assert_eq!(stats.loaded, 2);
    }

    #[test]
    fn test_missing_column() {
        let csv = "comid,other\n1,2\n";
        let err = FlowlineTable::from_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::MissingColumn {
                table: "flowline",
                column: "LevelPathI"
            }
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = FlowlineTable::from_pairs([(1, 10), (2, 20)]);
        base.merge(FlowlineTable::from_pairs([(2, 21), (3, 30)]));
        assert_eq!(base.lookup_terminal_path(1), Some(10));
        assert_eq!(base.lookup_terminal_path(2), Some(21));
        assert_eq!(base.lookup_terminal_path(3), Some(30));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_from_pairs_first_wins() {
        let table = MainstemTable::from_pairs([(5, 1), (5, 2)]);
        assert_eq!(table.lookup_mainstem(5), Some(1));
    }
}
