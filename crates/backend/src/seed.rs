use std::path::{Path, PathBuf};

use crate::storage::{SeedData, Storage, StorageError};

pub const SEED_FILE: &str = "seed.json";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub fn load(assets_dir: &Path) -> Result<SeedData, SeedError> {
    let path = assets_dir.join(SEED_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|source| SeedError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SeedError::Parse { path, source })
}

/// Load the demo data and write it into an empty database.
pub fn apply(storage: &Storage, assets_dir: &Path) -> Result<bool, SeedError> {
    let data = load(assets_dir)?;
    let written = storage.seed_if_empty(&data)?;
    if written {
        tracing::info!(
            users = data.users.len(),
            vessels = data.vessels.len(),
            projects = data.projects.len(),
            work_items = data.work_items.len(),
            "Seeded demo data"
        );
    } else {
        tracing::debug!("Database already populated, skipping seed");
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::temp_storage;

    fn repo_assets() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets")
    }

    #[test]
    fn test_bundled_seed_parses() {
        let data = load(&repo_assets()).unwrap();
        assert_eq!(data.vessels.len(), 3);
        assert_eq!(data.projects.len(), 3);
        assert!(data.users.iter().any(|u| u.name == "Captain Paul"));
        // Every project points at a seeded vessel
        for p in &data.projects {
            assert!(data.vessels.iter().any(|v| v.id == p.vessel_id), "{}", p.name);
        }
        for w in &data.work_items {
            assert!(data.projects.iter().any(|p| p.id == w.project_id), "{}", w.title);
        }
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (_dir, storage) = temp_storage();
        assert!(apply(&storage, &repo_assets()).unwrap());
        assert!(!apply(&storage, &repo_assets()).unwrap());
        assert_eq!(storage.count_projects().unwrap(), 3);
    }

    #[test]
    fn test_missing_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }

    #[test]
    fn test_malformed_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SEED_FILE), "{ not json").unwrap();
        assert!(matches!(load(dir.path()).unwrap_err(), SeedError::Parse { .. }));
    }
}
