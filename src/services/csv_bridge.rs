//! CSV export and import for the managed table.
//!
//! Export writes a fixed `id,name,value,created_at` header. Import accepts
//! any header layout as long as one column looks like a name and another
//! like a value; see [`FIELD_ALIASES`].

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::services::database::traits::{NewRecord, Record};
use crate::services::database::{RecordStore, StoreError, StoreResult};

/// What to do with a value cell that is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionPolicy {
    /// Store the row with value 0.
    #[default]
    Lenient,
    /// Abort the whole import.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(usize),
    /// Every row was filtered out; the store was not touched.
    NothingToImport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    Name,
    Value,
}

impl LogicalField {
    fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Value => "value",
        }
    }
}

/// Match rule applied to a normalized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasPredicate {
    Contains(&'static str),
}

impl AliasPredicate {
    fn matches(self, header: &str) -> bool {
        match self {
            Self::Contains(needle) => header.contains(needle),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub field: LogicalField,
    pub predicates: &'static [AliasPredicate],
}

/// Resolution order: fields are resolved top to bottom, and a column claimed
/// by an earlier field is not offered to later ones. Within a field, the
/// first column in header order matching any predicate wins.
pub const FIELD_ALIASES: [FieldAliases; 2] = [
    FieldAliases {
        field: LogicalField::Name,
        predicates: &[AliasPredicate::Contains("name")],
    },
    FieldAliases {
        field: LogicalField::Value,
        predicates: &[
            AliasPredicate::Contains("value"),
            AliasPredicate::Contains("val"),
        ],
    },
];

/// Cell spellings read as missing, in addition to the empty cell.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Empty after trimming, or one of [`MISSING_MARKERS`].
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Trim (including a leading byte-order mark) and lowercase.
pub fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Column indexes of the name and value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name: usize,
    pub value: usize,
}

pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> StoreResult<ColumnMapping> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
    let mut claimed: Vec<usize> = Vec::with_capacity(FIELD_ALIASES.len());
    let mut mapping = ColumnMapping { name: 0, value: 0 };

    for aliases in &FIELD_ALIASES {
        let index = normalized
            .iter()
            .enumerate()
            .filter(|(idx, _)| !claimed.contains(idx))
            .find(|(_, header)| aliases.predicates.iter().any(|p| p.matches(header)))
            .map(|(idx, _)| idx)
            .ok_or_else(|| {
                StoreError::ImportValidation(format!(
                    "no '{}' column among headers [{}]",
                    aliases.field.label(),
                    normalized.join(", ")
                ))
            })?;

        claimed.push(index);
        match aliases.field {
            LogicalField::Name => mapping.name = index,
            LogicalField::Value => mapping.value = index,
        }
    }

    Ok(mapping)
}

/// Parse a non-empty value cell: integer, else a finite float truncated
/// toward zero, else 0 (lenient) or an error (strict).
pub fn coerce_value(cell: &str, policy: CoercionPolicy) -> StoreResult<i64> {
    let cell = cell.trim();
    if let Ok(v) = cell.parse::<i64>() {
        return Ok(v);
    }
    if let Ok(v) = cell.parse::<f64>() {
        if v.is_finite() {
            return Ok(v.trunc() as i64);
        }
    }

    match policy {
        CoercionPolicy::Lenient => {
            tracing::debug!("Coercing non-numeric value '{}' to 0", cell);
            Ok(0)
        }
        CoercionPolicy::Strict => Err(StoreError::ImportValidation(format!(
            "value '{}' is not a number",
            cell
        ))),
    }
}

/// Read CSV rows into records. Nothing is written anywhere.
pub fn parse_rows<R: Read>(reader: R, policy: CoercionPolicy) -> StoreResult<Vec<NewRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mapping = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let name = row.get(mapping.name).map(str::trim).unwrap_or_default();
        let value = row.get(mapping.value).map(str::trim).unwrap_or_default();
        if is_missing(name) || is_missing(value) {
            continue;
        }

        let value = coerce_value(value, policy).map_err(|e| match (e, row.position()) {
            (StoreError::ImportValidation(msg), Some(pos)) => {
                StoreError::ImportValidation(format!("line {}: {}", pos.line(), msg))
            }
            (e, _) => e,
        })?;
        records.push(NewRecord::new(name, value));
    }

    Ok(records)
}

/// Moves table contents to and from CSV through a `RecordStore`.
#[derive(Debug, Clone)]
pub struct CsvBridge {
    store: RecordStore,
    policy: CoercionPolicy,
}

impl CsvBridge {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            policy: CoercionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CoercionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Write a snapshot of the table to `path`. Returns rows written.
    ///
    /// The file is staged next to `path` and renamed into place, so a failed
    /// export leaves any previous file untouched.
    pub async fn export(&self, path: &Path) -> StoreResult<usize> {
        let records = self.store.select_all(None).await?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        self.write_records(&records, staged.as_file_mut())?;
        staged.persist(path).map_err(|e| e.error)?;

        tracing::info!("Exported {} rows to {}", records.len(), path.display());
        Ok(records.len())
    }

    pub async fn export_to_writer<W: Write>(&self, writer: W) -> StoreResult<usize> {
        let records = self.store.select_all(None).await?;
        self.write_records(&records, writer)?;
        Ok(records.len())
    }

    fn write_records<W: Write>(&self, records: &[Record], writer: W) -> StoreResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(self.store.manager().schema().column_names())?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load `path` into the table as one batch.
    pub async fn import(&self, path: &Path) -> StoreResult<ImportOutcome> {
        let file = File::open(path)?;
        let outcome = self.import_from_reader(file).await.inspect_err(|e| {
            tracing::warn!(kind = e.kind(), "Import from {} failed: {}", path.display(), e);
        })?;

        match outcome {
            ImportOutcome::Imported(n) => {
                tracing::info!("Imported {} rows from {}", n, path.display())
            }
            ImportOutcome::NothingToImport => {
                tracing::info!("{} has no valid rows, nothing to import", path.display())
            }
        }
        Ok(outcome)
    }

    pub async fn import_from_reader<R: Read>(&self, reader: R) -> StoreResult<ImportOutcome> {
        let records = parse_rows(reader, self.policy)?;
        if records.is_empty() {
            return Ok(ImportOutcome::NothingToImport);
        }

        let inserted = self.store.bulk_insert(&records).await?;
        Ok(ImportOutcome::Imported(inserted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::test_support::local_store;

    fn parse(input: &str) -> StoreResult<Vec<NewRecord>> {
        parse_rows(input.as_bytes(), CoercionPolicy::Lenient)
    }

    #[test]
    fn test_header_matching_ignores_case_and_whitespace() {
        let mapping = resolve_columns(&["id", "Name ", " VAL"]).unwrap();
        assert_eq!(mapping, ColumnMapping { name: 1, value: 2 });
    }

    #[test]
    fn test_first_matching_column_wins() {
        let mapping = resolve_columns(&["user_name", "nickname", "value", "valid"]).unwrap();
        assert_eq!(mapping, ColumnMapping { name: 0, value: 2 });
    }

    #[test]
    fn test_value_never_reuses_name_column() {
        // "name_value" is claimed by name; value must come from elsewhere.
        let mapping = resolve_columns(&["name_value", "amount_val"]).unwrap();
        assert_eq!(mapping, ColumnMapping { name: 0, value: 1 });

        assert!(resolve_columns(&["name_value"]).is_err());
    }

    #[test]
    fn test_missing_columns_rejected() {
        let err = resolve_columns(&["id", "title", "amount"]).unwrap_err();
        assert!(matches!(err, StoreError::ImportValidation(_)));

        let err = resolve_columns(&["name", "amount"]).unwrap_err();
        assert!(err.to_string().contains("'value'"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let rows = parse("\u{feff}Name,Value\nAlice,10\n").unwrap();
        assert_eq!(rows, vec![NewRecord::new("Alice", 10)]);
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(coerce_value("42", CoercionPolicy::Lenient).unwrap(), 42);
        assert_eq!(coerce_value(" -7 ", CoercionPolicy::Lenient).unwrap(), -7);
        assert_eq!(coerce_value("3.9", CoercionPolicy::Lenient).unwrap(), 3);
        assert_eq!(coerce_value("-2.5", CoercionPolicy::Lenient).unwrap(), -2);
        assert_eq!(coerce_value("1e3", CoercionPolicy::Lenient).unwrap(), 1000);
        assert_eq!(coerce_value("abc", CoercionPolicy::Lenient).unwrap(), 0);
        assert_eq!(coerce_value("inf", CoercionPolicy::Lenient).unwrap(), 0);
        assert!(coerce_value("abc", CoercionPolicy::Strict).is_err());
    }

    #[test]
    fn test_rows_with_empty_cells_are_dropped() {
        let input = "name,value,extra\n\
                     Alice,10,x\n\
                     ,5,x\n\
                     Bob,,x\n\
                     \x20\x20,3,x\n\
                     Carol\n\
                     \x20Dave\x20,oops,x\n";
        let rows = parse(input).unwrap();
        assert_eq!(
            rows,
            vec![NewRecord::new("Alice", 10), NewRecord::new("Dave", 0)]
        );
    }

    #[test]
    fn test_missing_markers_drop_rows() {
        let rows = parse("name,value\nBob,NA\nnull,3\nCarl,nan\nNone,1\nEve, N/A \nAna,7\n").unwrap();
        assert_eq!(rows, vec![NewRecord::new("Ana", 7)]);

        assert!(is_missing("  "));
        assert!(is_missing("#N/A"));
        // Markers are case-sensitive; these are ordinary names.
        assert!(!is_missing("Na"));
        assert!(!is_missing("nil"));
    }

    #[test]
    fn test_strict_policy_reports_line() {
        let err = parse_rows("name,value\nAlice,1\nBob,oops\n".as_bytes(), CoercionPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, StoreError::ImportValidation(_)));
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_round_trip_preserves_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone());
        let csv_path = dir.path().join("export.csv");

        smol::block_on(async {
            store.create_table().await.unwrap();
            store.insert_row("Alice", 10).await.unwrap();
            store.insert_row("Alice", 10).await.unwrap();
            store
                .bulk_insert(&[NewRecord::new("Bob, Jr.", -3), NewRecord::new("Zoë", 0)])
                .await
                .unwrap();

            let pairs = |rows: Vec<Record>| {
                let mut pairs: Vec<(String, i64)> =
                    rows.into_iter().map(|r| (r.name, r.value)).collect();
                pairs.sort();
                pairs
            };
            let before = pairs(store.select_all(None).await.unwrap());

            assert_eq!(bridge.export(&csv_path).await.unwrap(), 4);
            store.drop_table().await.unwrap();
            store.create_table().await.unwrap();

            let outcome = bridge.import(&csv_path).await.unwrap();
            assert_eq!(outcome, ImportOutcome::Imported(4));

            let after = pairs(store.select_all(None).await.unwrap());
            assert_eq!(before, after);
        });
    }

    #[test]
    fn test_export_header_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone());

        smol::block_on(async {
            store.create_table().await.unwrap();

            let mut empty = Vec::new();
            assert_eq!(bridge.export_to_writer(&mut empty).await.unwrap(), 0);
            assert_eq!(String::from_utf8(empty).unwrap(), "id,name,value,created_at\n");

            store.insert_row("Alice", 10).await.unwrap();
            let mut out = Vec::new();
            bridge.export_to_writer(&mut out).await.unwrap();
            let text = String::from_utf8(out).unwrap();
            let line = text.lines().nth(1).unwrap();
            assert!(line.starts_with("1,Alice,10,"), "{line}");
        });
    }

    #[test]
    fn test_failed_export_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone());
        let csv_path = dir.path().join("prev.csv");
        let previous = "id,name,value,created_at\n1,Keep,1,\n";
        std::fs::write(&csv_path, previous).unwrap();

        smol::block_on(async {
            let err = bridge.export(&csv_path).await.unwrap_err();
            assert!(matches!(err, StoreError::Schema(_)), "got {err:?}");
        });

        assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), previous);
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_none())
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_export_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone());
        let csv_path = dir.path().join("out.csv");
        std::fs::write(&csv_path, "stale contents\n").unwrap();

        smol::block_on(async {
            store.create_table().await.unwrap();
            store.insert_row("Alice", 10).await.unwrap();
            assert_eq!(bridge.export(&csv_path).await.unwrap(), 1);
        });

        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("id,name,value,created_at\n1,Alice,10,"), "{text}");
    }

    #[test]
    fn test_import_without_columns_leaves_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone());

        smol::block_on(async {
            store.create_table().await.unwrap();
            store.insert_row("Alice", 10).await.unwrap();

            let err = bridge
                .import_from_reader("title,amount\nBob,5\n".as_bytes())
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::ImportValidation(_)));
            assert_eq!(store.count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_import_with_no_valid_rows_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone());

        smol::block_on(async {
            // No table either: a no-op must not touch the store at all.
            let outcome = bridge
                .import_from_reader("Name,Val\n,1\nBob,\n".as_bytes())
                .await
                .unwrap();
            assert_eq!(outcome, ImportOutcome::NothingToImport);
        });
    }

    #[test]
    fn test_strict_import_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = local_store(dir.path());
        let bridge = CsvBridge::new(store.clone()).with_policy(CoercionPolicy::Strict);

        smol::block_on(async {
            store.create_table().await.unwrap();
            let result = bridge
                .import_from_reader("name,value\nAlice,1\nBob,x\n".as_bytes())
                .await;
            assert!(result.is_err());
            assert_eq!(store.count().await.unwrap(), 0);
        });
    }
}
