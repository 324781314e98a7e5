//! Seed folders: one circle list file per seed candidate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::Circle;

use super::{IoError, read_circles, write_circles};

/// Extension of circle list files inside a seed folder.
pub const SEED_EXTENSION: &str = "csv";

/// File name of the `index`-th seed, e.g. `seed_007.csv`.
pub fn seed_file_name(index: usize) -> String {
    format!("seed_{:03}.{}", index, SEED_EXTENSION)
}

/// Circle list files in `dir`, sorted by file name.
pub fn seed_files(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == SEED_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every circle list in a seed folder, in file name order.
///
/// Counts are not checked here; the engine validates them against its
/// configuration.
pub fn load_seed_folder(dir: &Path) -> Result<Vec<Vec<Circle>>, IoError> {
    seed_files(dir)?.iter().map(|p| read_circles(p)).collect()
}

/// Write circle lists as `seed_000.csv`, `seed_001.csv`, ... into `dir`,
/// creating it if needed.
pub fn write_seed_folder(dir: &Path, seeds: &[Vec<Circle>]) -> Result<Vec<PathBuf>, IoError> {
    fs::create_dir_all(dir)?;
    seeds
        .iter()
        .enumerate()
        .map(|(i, circles)| {
            let path = dir.join(seed_file_name(i));
            write_circles(&path, circles)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_name() {
        assert_eq!(seed_file_name(7), "seed_007.csv");
        assert_eq!(seed_file_name(1234), "seed_1234.csv");
    }

    #[test]
    fn test_write_and_load_folder() {
        let dir = tempfile::tempdir().unwrap();
        let seeds_dir = dir.path().join("seeds");
        let seeds = vec![
            vec![Circle::new(0.1, 0.1, 0.05)],
            vec![Circle::new(0.2, 0.2, 0.05), Circle::new(0.3, 0.3, 0.05)],
        ];
        let written = write_seed_folder(&seeds_dir, &seeds).unwrap();
        assert_eq!(written.len(), 2);

        // Unrelated files are ignored.
        fs::write(seeds_dir.join("notes.txt"), "hello").unwrap();
        fs::create_dir(seeds_dir.join("nested.csv")).unwrap();

        let loaded = load_seed_folder(&seeds_dir).unwrap();
        assert_eq!(loaded, seeds);
    }

    #[test]
    fn test_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.csv", "c.csv"] {
            fs::write(dir.path().join(name), "0.5,0.5,0.1\n").unwrap();
        }
        let names: Vec<String> = seed_files(dir.path())
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
    }

    #[test]
    fn test_missing_folder_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_seed_folder(&dir.path().join("nope")).is_err());
    }
}
