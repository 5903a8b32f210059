//! Accumulated per-wallet RPC endpoints and their CSV persistence.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// First column of the output file.
pub const ADDRESS_COLUMN: &str = "Address";

#[derive(Debug, Clone, PartialEq, Eq)]
struct AddressRow {
    address: String,
    // (chain, url) in the order chains were first recorded
    cells: Vec<(String, String)>,
}

/// Address -> chain -> mainnet URL.
///
/// Entries are only ever added or overwritten. Rows keep first-merge order and
/// each row keeps the order its chains were first seen, which is what decides
/// the column order of the written file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<AddressRow>,
    index: HashMap<String, usize>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `url` for `(address, chain)`, replacing any earlier value.
    pub fn merge(&mut self, address: &str, chain: &str, url: &str) {
        let idx = match self.index.get(address) {
            Some(&idx) => idx,
            None => {
                self.rows.push(AddressRow {
                    address: address.to_string(),
                    cells: Vec::new(),
                });
                self.index.insert(address.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };

        let row = &mut self.rows[idx];
        match row.cells.iter_mut().find(|(name, _)| name == chain) {
            Some((_, existing)) => *existing = url.to_string(),
            None => row.cells.push((chain.to_string(), url.to_string())),
        }
    }

    pub fn get(&self, address: &str, chain: &str) -> Option<&str> {
        let row = &self.rows[*self.index.get(address)?];
        row.cells
            .iter()
            .find(|(name, _)| name == chain)
            .map(|(_, url)| url.as_str())
    }

    /// Number of addresses with at least one recorded chain.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of chain names over the whole table, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for (chain, _) in &row.cells {
                if !columns.contains(&chain.as_str()) {
                    columns.push(chain.as_str());
                }
            }
        }
        columns
    }

    /// Serialize as CSV: `Address` plus one column per chain, empty cells where
    /// a wallet has no mainnet URL for that chain.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let columns = self.columns();
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push(ADDRESS_COLUMN);
        header.extend(columns.iter().copied());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(columns.len() + 1);
            record.push(row.address.as_str());
            for column in &columns {
                let cell = row
                    .cells
                    .iter()
                    .find(|(chain, _)| chain.as_str() == *column)
                    .map(|(_, url)| url.as_str())
                    .unwrap_or("");
                record.push(cell);
            }
            writer.write_record(&record)?;
        }

        writer.into_inner().context("Failed to flush CSV writer")
    }
}

/// Rewrite the whole table to `path`.
///
/// Goes through a sibling temp file and a rename, so the previous table stays
/// intact if the process dies mid-write.
pub fn persist(table: &ResultTable, path: &Path) -> Result<()> {
    let bytes = table.to_csv()?;
    let tmp = tmp_path_for(path);

    fs::write(&tmp, &bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} to {}", tmp.display(), path.display()))?;

    tracing::info!(
        "Saved RPC data for {} wallets ({} chains) to {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("results.csv");
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_column_union_with_empty_cells() {
        let mut table = ResultTable::new();
        table.merge("0xA", "eth", "https://a-eth");
        table.merge("0xB", "btc", "https://b-btc");

        assert_eq!(table.columns(), vec!["eth", "btc"]);
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(
            csv,
            "Address,eth,btc\n0xA,https://a-eth,\n0xB,,https://b-btc\n"
        );
    }

    #[test]
    fn test_merge_overwrites_without_clearing() {
        let mut table = ResultTable::new();
        table.merge("0xA", "eth", "https://old");
        table.merge("0xA", "near", "https://near");
        table.merge("0xA", "eth", "https://new");

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("0xA", "eth"), Some("https://new"));
        assert_eq!(table.get("0xA", "near"), Some("https://near"));
        assert_eq!(table.get("0xA", "btc"), None);
        assert_eq!(table.get("0xB", "eth"), None);
        // Overwrite keeps the original column position
        assert_eq!(table.columns(), vec!["eth", "near"]);
    }

    #[test]
    fn test_column_order_follows_first_sighting() {
        let mut table = ResultTable::new();
        table.merge("0xA", "near", "n");
        table.merge("0xB", "eth", "e");
        table.merge("0xB", "near", "n2");
        table.merge("0xA", "axelar", "x");

        // Walk rows in order, then each row's chains in order
        assert_eq!(table.columns(), vec!["near", "axelar", "eth"]);
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Address,near,axelar,eth\n0xA,n,x,\n0xB,n2,,e\n");
    }

    #[test]
    fn test_urls_with_commas_are_quoted() {
        let mut table = ResultTable::new();
        table.merge("0xA", "eth", "https://x/?a=1,2");
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Address,eth\n0xA,\"https://x/?a=1,2\"\n");
    }

    #[test]
    fn test_persist_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpcData.csv");

        let mut table = ResultTable::new();
        table.merge("0xA", "eth", "https://a");
        persist(&table, &path).unwrap();
        assert_eq!(read(&path), "Address,eth\n0xA,https://a\n");

        table.merge("0xB", "btc", "https://b");
        persist(&table, &path).unwrap();
        assert_eq!(read(&path), "Address,eth,btc\n0xA,https://a,\n0xB,,https://b\n");

        // No temp file left behind
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        persist(&ResultTable::new(), &path).unwrap();
        assert_eq!(read(&path), "Address\n");
    }
}
