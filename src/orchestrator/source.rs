use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One row of the wallet file. Columns other than `privateKey` are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EncryptedWalletRecord {
    /// `<iv-hex>:<ciphertext-hex>`
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

/// Read every wallet record before any network traffic starts.
pub fn read_wallet_records(path: &Path) -> Result<Vec<EncryptedWalletRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open wallet file {}", path.display()))?;
    parse_wallet_records(file).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn parse_wallet_records<R: Read>(reader: R) -> Result<Vec<EncryptedWalletRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for (line, row) in reader.deserialize().enumerate() {
        let record: EncryptedWalletRecord =
            row.with_context(|| format!("Invalid wallet row {}", line + 1))?;
        records.push(record);
    }
    Ok(records)
}
