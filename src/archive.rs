use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::Result;
use crate::logger::{logged, PipelineLogger};

/// Streams `link` to `archive_path`, then unpacks every entry into `dest_dir`.
/// Returns the paths of the files written.
pub fn download_and_extract(
    client: &Client,
    logger: &dyn PipelineLogger,
    link: &str,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>> {
    logged(logger, download_archive(client, link, archive_path))?;
    let files = logged(logger, extract_archive(archive_path, dest_dir))?;
    logger.info(&format!(
        "{} Downloaded and Extracted Successfully ({} files)",
        archive_path.display(),
        files.len()
    ));
    Ok(files)
}

/// No resume and no size check: a truncated body only shows up when the
/// archive is opened.
pub fn download_archive(client: &Client, link: &str, archive_path: &Path) -> Result<u64> {
    let mut response = client.get(link).send()?.error_for_status()?;

    let mut file = BufWriter::new(File::create(archive_path)?);
    let written = response.copy_to(&mut file)?;
    file.flush()?;

    Ok(written)
}

/// Writes every file entry under `dest_dir`, replacing files of the same name.
/// Entries whose names would escape `dest_dir` are skipped.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        written.push(out_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extracts_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("DLTINS.zip");
        write_zip(
            &archive,
            &[("DLTINS_20210117_01of01.xml", "<BizData/>"), ("nested/readme.txt", "hi")],
        );

        let files = extract_archive(&archive, dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("DLTINS_20210117_01of01.xml")).unwrap(),
            "<BizData/>"
        );
        assert_eq!(fs::read_to_string(dir.path().join("nested/readme.txt")).unwrap(), "hi");
    }

    #[test]
    fn test_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("DLTINS_1.xml");
        fs::write(&target, "stale content that is longer than the new one").unwrap();

        let archive = dir.path().join("DLTINS.zip");
        write_zip(&archive, &[("DLTINS_1.xml", "fresh")]);

        extract_archive(&archive, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "fresh");
    }

    #[test]
    fn test_corrupt_archive_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("DLTINS.zip");
        fs::write(&archive, b"<html>404 Not Found</html>").unwrap();

        let err = extract_archive(&archive, dir.path()).unwrap_err();
        assert!(err.is_archive_error());
    }

    #[test]
    fn test_truncated_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("DLTINS.zip");
        write_zip(&archive, &[("DLTINS_1.xml", "x".repeat(4096).as_str())]);

        let bytes = fs::read(&archive).unwrap();
        fs::write(&archive, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(extract_archive(&archive, dir.path()), Err(Error::Archive(_))));
    }
}
