//! Copia de seguridad y reinicio del archivo de base de datos.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{info, warn};

use crate::error::PersistenceError;

/// Nombre del archivo de copia: `backup_YYYYmmdd_HHMMSS.db`.
pub fn backup_file_name(now: NaiveDateTime) -> String {
    format!("backup_{}.db", now.format("%Y%m%d_%H%M%S"))
}

/// Copia `db_path` dentro de `backup_dir` (creándolo si falta) y devuelve la
/// ruta de la copia.
pub fn backup_database(db_path: &Path, backup_dir: &Path, now: NaiveDateTime) -> Result<PathBuf, PersistenceError> {
    if !db_path.is_file() {
        return Err(PersistenceError::Io(std::io::Error::new(std::io::ErrorKind::NotFound,
                                                            format!("database file {} does not exist", db_path.display()))));
    }
    fs::create_dir_all(backup_dir)?;
    let target = backup_dir.join(backup_file_name(now));
    fs::copy(db_path, &target)?;
    info!("Backup created: {}", target.display());
    Ok(target)
}

/// Borra el archivo de base de datos. El llamador vuelve a crear el esquema
/// (pool nuevo + siembra). Un archivo inexistente no es error.
pub fn reset_database(db_path: &Path) -> Result<(), PersistenceError> {
    match fs::remove_file(db_path) {
        Ok(()) => {
            info!("Database file {} removed", db_path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("reset_database: {} did not exist", db_path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn backup_name_is_timestamped() {
        assert_eq!(backup_file_name(at(9, 5, 1)), "backup_20250307_090501.db");
    }

    #[test]
    fn backup_copies_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("contracts.db");
        fs::write(&db, b"sqlite bytes").unwrap();
        let target = backup_database(&db, &dir.path().join("backups"), at(18, 0, 0)).unwrap();
        assert_eq!(target.file_name().unwrap(), "backup_20250307_180000.db");
        assert_eq!(fs::read(&target).unwrap(), b"sqlite bytes");
    }

    #[test]
    fn backup_of_missing_file_fails_and_reset_tolerates_it() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("missing.db");
        assert!(matches!(backup_database(&db, dir.path(), at(1, 0, 0)), Err(PersistenceError::Io(_))));
        assert!(reset_database(&db).is_ok());
    }
}
