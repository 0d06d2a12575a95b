use crate::config::{Metadata, ROSTER_DIR};
use crate::error::{Result, RosterError};
use crate::storage::SqliteStorage;
use std::fs;
use std::path::Path;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created, or the
/// workspace already has a database and `force` is not set.
pub fn execute(force: bool, root_dir: Option<&Path>) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let roster_dir = base_dir.join(ROSTER_DIR);
    let metadata = Metadata::default();
    let db_path = roster_dir.join(&metadata.database);

    if roster_dir.exists() {
        if db_path.exists() && !force {
            return Err(RosterError::AlreadyInitialized { path: db_path });
        }
    } else {
        fs::create_dir(&roster_dir)?;
    }

    if force && db_path.exists() {
        tracing::info!(path = %db_path.display(), "Removing existing database");
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = roster_dir.join(format!("{}{suffix}", metadata.database));
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
    }

    // Creates the file and applies the schema.
    SqliteStorage::open(&db_path)?;

    let metadata_path = roster_dir.join("metadata.json");
    if !metadata_path.exists() || force {
        metadata.save(&roster_dir)?;
    }

    let config_path = roster_dir.join("config.yaml");
    if !config_path.exists() {
        let config = r"# Roster Project Configuration
# actor: hr-import
# default-parent: General
# max-code-attempts: 100
# project-code-prefix: PRJ
# cost-center-code-prefix: CC
";
        fs::write(config_path, config)?;
    }

    let gitignore_path = roster_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let gitignore = r"# Database
*.db
*.db-shm
*.db-wal

# Temporary
*.tmp
";
        fs::write(gitignore_path, gitignore)?;
    }

    println!("Initialized roster workspace in {ROSTER_DIR}/");
    Ok(())
}
