use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ComptesError, Result};

/// Account exports picked up from the desktop folder.
pub const STAGING_MASK: &str = r"^Comptes.*ods$";
/// Staged files the converter and the watcher act on.
pub const SOURCE_MASK: &str = r"^Comptes.*";

fn staging_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(STAGING_MASK).expect("static regex"))
}

fn source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SOURCE_MASK).expect("static regex"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn is_valid_file(path: &Path) -> bool {
    source_re().is_match(&file_name(path))
}

// Regular files directly under `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy every desktop export matching the staging mask into `staging_dir`,
/// creating it if needed. Existing copies are overwritten.
pub fn sweep_and_push(desktop_dir: &Path, staging_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(staging_dir)?;
    let re = staging_re();
    let mut copied = Vec::new();
    for src in list_files(desktop_dir)? {
        let name = file_name(&src);
        if !re.is_match(&name) {
            continue;
        }
        let dest = staging_dir.join(&name);
        std::fs::copy(&src, &dest)?;
        tracing::info!(file = %name, "staged");
        copied.push(dest);
    }
    Ok(copied)
}

/// Staged account workbooks, sorted by name.
pub fn source_files(staging_dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_files(staging_dir)?
        .into_iter()
        .filter(|p| is_valid_file(p))
        .collect())
}

/// CSV extracts waiting to be loaded, sorted by name.
pub fn extract_files(extract_dir: &Path) -> Result<Vec<PathBuf>> {
    if !extract_dir.exists() {
        return Ok(Vec::new());
    }
    Ok(list_files(extract_dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")))
        .collect())
}

/// The salary workbook: the last `.ods` by name, skipping lock files (`~…`)
/// and hidden files.
pub fn salary_source(staging_dir: &Path) -> Result<PathBuf> {
    list_files(staging_dir)?
        .into_iter()
        .rev()
        .find(|p| {
            let name = file_name(p);
            !name.starts_with('~') && !name.starts_with('.') && name.ends_with(".ods")
        })
        .ok_or_else(|| {
            ComptesError::Other(format!("no salary workbook (.ods) in {}", staging_dir.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    #[test]
    fn test_sweep_copies_only_account_exports() {
        let desktop = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let target = staging.path().join("nested");
        for name in ["Comptes_2023.ods", "Comptes_2022.ods", "Comptes_2023.xlsx", "Photo.ods", "~Comptes_2023.ods"] {
            touch(desktop.path(), name);
        }

        let copied = sweep_and_push(desktop.path(), &target).unwrap();
        let names: Vec<String> = copied.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["Comptes_2022.ods", "Comptes_2023.ods"]);
        assert!(target.join("Comptes_2023.ods").exists());
        assert!(!target.join("Photo.ods").exists());
    }

    #[test]
    fn test_source_files_and_validity() {
        let staging = tempfile::tempdir().unwrap();
        for name in ["Comptes_2023.ods", "Comptes_2022.xlsx", "Salaires.ods", ".~lock.Comptes_2023.ods#"] {
            touch(staging.path(), name);
        }
        let names: Vec<String> = source_files(staging.path()).unwrap().iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["Comptes_2022.xlsx", "Comptes_2023.ods"]);
        assert!(is_valid_file(Path::new("/x/Comptes 2024.ods")));
        assert!(!is_valid_file(Path::new("/x/comptes_2024.ods")));
    }

    #[test]
    fn test_salary_source_picks_last_visible_ods() {
        let staging = tempfile::tempdir().unwrap();
        for name in ["Comptes_2023.ods", "Salaires.ods", "~Zsalaires.ods", ".Zhidden.ods", "notes.txt"] {
            touch(staging.path(), name);
        }
        assert_eq!(file_name(&salary_source(staging.path()).unwrap()), "Salaires.ods");

        let empty = tempfile::tempdir().unwrap();
        assert!(salary_source(empty.path()).is_err());
    }

    #[test]
    fn test_extract_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Comptes_2023.csv");
        touch(dir.path(), "Comptes_2022.csv");
        touch(dir.path(), "readme.md");
        let names: Vec<String> = extract_files(dir.path()).unwrap().iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["Comptes_2022.csv", "Comptes_2023.csv"]);
        assert!(extract_files(&dir.path().join("missing")).unwrap().is_empty());
    }
}
