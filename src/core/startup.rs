use anyhow::{Context, Result};
use tracing::info;

use crate::core::state::AppState;
use crate::wal::wal::WalOperation;

// this runs at boot time
pub fn apply_wal_operations(state: &AppState, operations: &[WalOperation]) {
    for op in operations {
        state.users.apply_replayed(op);
    }
}

/// Replay the WAL into the user store and prepare the picture directory
pub fn restore_state(state: &AppState) -> Result<usize> {
    let operations = state.wal.replay().context("Failed to replay WAL")?;

    apply_wal_operations(state, &operations);

    info!(
        wal_path = %state.wal.path().display(),
        operations_replayed = operations.len(),
        users_loaded = state.users.len(),
        "WAL replay completed"
    );

    state
        .pictures
        .ensure_dirs()
        .context(format!(
            "Failed to create picture directory under {}",
            state.pictures.root().display()
        ))?;

    Ok(operations.len())
}
