use anyhow::{anyhow, bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::models::user::{DegreeYear, UserUpdate};

/// Marker for an absent optional column
const NONE_MARKER: &str = "-";

/// WAL operation types
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    CreateUser {
        id: u32,
        username: String,
        userid: String,
        password_hash: String,
        degree_year: DegreeYear,
        created_at: i64,
    },
    UpdateUser {
        id: u32,
        update: UserUpdate,
    },
}

// Text columns are hex encoded so free-text statuses may contain '|'.
fn encode_text(value: &str) -> String {
    hex::encode(value.as_bytes())
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex text column")?;
    String::from_utf8(bytes).context("Text column is not UTF-8")
}

fn encode_opt_text(value: &Option<String>) -> String {
    match value {
        Some(v) => encode_text(v),
        None => NONE_MARKER.to_string(),
    }
}

fn decode_opt_text(field: &str) -> Result<Option<String>> {
    if field == NONE_MARKER {
        Ok(None)
    } else {
        decode_text(field).map(Some)
    }
}

impl WalOperation {
    fn to_string(&self) -> String {
        match self {
            WalOperation::CreateUser {
                id,
                username,
                userid,
                password_hash,
                degree_year,
                created_at,
            } => format!(
                "CREATE_USER|{}|{}|{}|{}|{}|{}",
                id,
                encode_text(username),
                encode_text(userid),
                encode_text(password_hash),
                degree_year,
                created_at
            ),
            WalOperation::UpdateUser { id, update } => {
                let degree_year = update
                    .degree_year
                    .map(|d| d.as_str().to_string())
                    .unwrap_or_else(|| NONE_MARKER.to_string());
                let is_active = match update.is_active {
                    Some(true) => "1".to_string(),
                    Some(false) => "0".to_string(),
                    None => NONE_MARKER.to_string(),
                };
                let updated_at = update
                    .updated_at
                    .map(|ts| ts.to_string())
                    .unwrap_or_else(|| NONE_MARKER.to_string());
                format!(
                    "UPDATE_USER|{}|{}|{}|{}|{}|{}|{}|{}",
                    id,
                    encode_opt_text(&update.username),
                    encode_opt_text(&update.password_hash),
                    encode_opt_text(&update.status),
                    degree_year,
                    encode_opt_text(&update.picture_path),
                    is_active,
                    updated_at
                )
            }
        }
    }

    fn from_string(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"CREATE_USER") => {
                if parts.len() != 7 {
                    bail!("Invalid CREATE_USER format");
                }
                let id = parts[1].parse::<u32>().context("Invalid user ID")?;
                let username = decode_text(parts[2]).context("Invalid username")?;
                let userid = decode_text(parts[3]).context("Invalid userid")?;
                let password_hash = decode_text(parts[4]).context("Invalid password hash")?;
                let degree_year = parts[5].parse::<DegreeYear>()?;
                let created_at = parts[6].parse::<i64>().context("Invalid created_at")?;

                Ok(WalOperation::CreateUser {
                    id,
                    username,
                    userid,
                    password_hash,
                    degree_year,
                    created_at,
                })
            }
            Some(&"UPDATE_USER") => {
                if parts.len() != 9 {
                    bail!("Invalid UPDATE_USER format");
                }
                let id = parts[1].parse::<u32>().context("Invalid user ID")?;
                let degree_year = match parts[5] {
                    NONE_MARKER => None,
                    s => Some(s.parse::<DegreeYear>()?),
                };
                let is_active = match parts[7] {
                    NONE_MARKER => None,
                    "1" => Some(true),
                    "0" => Some(false),
                    other => bail!("Invalid is_active flag '{}'", other),
                };
                let updated_at = match parts[8] {
                    NONE_MARKER => None,
                    s => Some(s.parse::<i64>().context("Invalid updated_at")?),
                };

                Ok(WalOperation::UpdateUser {
                    id,
                    update: UserUpdate {
                        username: decode_opt_text(parts[2])?,
                        password_hash: decode_opt_text(parts[3])?,
                        status: decode_opt_text(parts[4])?,
                        degree_year,
                        picture_path: decode_opt_text(parts[6])?,
                        is_active,
                        updated_at,
                    },
                })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

/// Append-only log of user mutations, replayed at boot
pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.to_string();
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("WAL lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        file.sync_data().context("Failed to sync WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::from_string(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
