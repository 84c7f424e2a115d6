//! Install row operations: record, list, get, remove.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::{Path, PathBuf};

use super::db::InstallDb;
use super::types::InstallRecord;
use crate::audit::Release;

fn record_from_row(row: &SqliteRow) -> InstallRecord {
    let lib_dir: String = row.get("lib_dir");
    InstallRecord {
        name: row.get("name"),
        version: row.get("version"),
        url: row.get("url"),
        sha256: row.get("sha256"),
        lib_dir: PathBuf::from(lib_dir),
        installed_at: row.get("installed_at"),
    }
}

impl InstallDb {
    /// Insert or refresh the row for `record.name@record.version`.
    pub async fn record_install(&self, record: &InstallRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO installs (name, version, url, sha256, lib_dir, installed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (name, version) DO UPDATE SET
                url = excluded.url,
                sha256 = excluded.sha256,
                lib_dir = excluded.lib_dir,
                installed_at = excluded.installed_at
            "#,
        )
        .bind(&record.name)
        .bind(&record.version)
        .bind(&record.url)
        .bind(&record.sha256)
        .bind(record.lib_dir.to_string_lossy().into_owned())
        .bind(record.installed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All installs, by name then newest first.
    pub async fn list_installs(&self) -> Result<Vec<InstallRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT name, version, url, sha256, lib_dir, installed_at
            FROM installs
            ORDER BY name ASC, installed_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Installed versions of one package, newest first.
    pub async fn installs_of(&self, name: &str) -> Result<Vec<InstallRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT name, version, url, sha256, lib_dir, installed_at
            FROM installs
            WHERE name = ?1
            ORDER BY installed_at DESC, id DESC
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    pub async fn get_install(&self, name: &str, version: &str) -> Result<Option<InstallRecord>> {
        let row = sqlx::query(
            r#"
            SELECT name, version, url, sha256, lib_dir, installed_at
            FROM installs
            WHERE name = ?1 AND version = ?2
            "#,
        )
        .bind(name)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    /// The row for `name@version` when it points at a keg other than `lib_dir`.
    /// One name@version lives in one prefix at a time.
    pub async fn recorded_elsewhere(
        &self,
        name: &str,
        version: &str,
        lib_dir: &Path,
    ) -> Result<Option<InstallRecord>> {
        Ok(self
            .get_install(name, version)
            .await?
            .filter(|record| record.lib_dir != lib_dir))
    }

    /// Recorded releases of `name`.
    pub async fn releases_for(&self, name: &str) -> Result<Vec<Release>> {
        Ok(self
            .installs_of(name)
            .await?
            .iter()
            .map(InstallRecord::release)
            .collect())
    }

    /// Every recorded release, across packages.
    pub async fn releases(&self) -> Result<Vec<Release>> {
        Ok(self
            .list_installs()
            .await?
            .iter()
            .map(InstallRecord::release)
            .collect())
    }

    /// Delete the row for `name@version`. Returns whether a row existed.
    pub async fn remove_install(&self, name: &str, version: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM installs WHERE name = ?1 AND version = ?2")
            .bind(name)
            .bind(version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
