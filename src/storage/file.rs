//! File-based storage implementation.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{GuidebotError, Result, StorageError};
use crate::storage::traits::{
    Storage, StorageConfig, StorageInput, StorageOutput, next_temp_name,
};

/// A file-based storage rooted in one directory.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: StorageConfig,
    /// Whether the storage is closed.
    closed: bool,
}

impl FileStorage {
    /// Create a new file storage in the given directory, creating the
    /// directory (and its parents) if it does not exist.
    pub fn new<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            std::fs::create_dir_all(&directory).map_err(|e| {
                StorageError::IoError(format!(
                    "Failed to create directory {}: {e}",
                    directory.display()
                ))
            })?;
        }

        if !directory.is_dir() {
            return Err(StorageError::IoError(format!(
                "Path is not a directory: {}",
                directory.display()
            ))
            .into());
        }

        Ok(FileStorage {
            directory,
            config,
            closed: false,
        })
    }

    /// Get the root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the full path for a file name.
    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    /// Check if the storage is closed.
    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(StorageError::StorageClosed.into())
        } else {
            Ok(())
        }
    }

    fn map_io(name: &str, e: std::io::Error) -> GuidebotError {
        if e.kind() == ErrorKind::NotFound {
            StorageError::FileNotFound(name.to_string()).into()
        } else {
            StorageError::IoError(format!("{name}: {e}")).into()
        }
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        self.check_closed()?;

        let file = File::open(self.file_path(name)).map_err(|e| Self::map_io(name, e))?;
        Ok(Box::new(FileInput::new(file, self.config.buffer_size)))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        self.check_closed()?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.file_path(name))
            .map_err(|e| Self::map_io(name, e))?;

        Ok(Box::new(FileOutput::new(
            file,
            self.config.buffer_size,
            self.config.sync_writes,
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        !self.closed && self.file_path(name).is_file()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.check_closed()?;

        match std::fs::remove_file(self.file_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(format!("Failed to delete {name}: {e}")).into()),
        }
    }

    fn list_files(&self) -> Result<Vec<String>> {
        self.check_closed()?;

        let mut files = Vec::new();
        let entries =
            std::fs::read_dir(&self.directory).map_err(|e| StorageError::IoError(e.to_string()))?;

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::IoError(e.to_string()))?;
            let path = entry.path();

            if path.is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        self.check_closed()?;

        let metadata = self
            .file_path(name)
            .metadata()
            .map_err(|e| Self::map_io(name, e))?;
        Ok(metadata.len())
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.check_closed()?;

        std::fs::rename(self.file_path(old_name), self.file_path(new_name)).map_err(|e| {
            StorageError::IoError(format!("Failed to rename {old_name} to {new_name}: {e}"))
        })?;

        Ok(())
    }

    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)> {
        self.check_closed()?;

        let temp_name = next_temp_name(prefix, |name| self.file_exists(name))?;
        let output = self.create_output(&temp_name)?;
        Ok((temp_name, output))
    }

    fn sync(&self) -> Result<()> {
        self.check_closed()?;
        // Outputs sync themselves on close.
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A file input implementation.
#[derive(Debug)]
pub struct FileInput {
    reader: BufReader<File>,
}

impl FileInput {
    fn new(file: File, buffer_size: usize) -> Self {
        FileInput {
            reader: BufReader::with_capacity(buffer_size, file),
        }
    }
}

impl Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl StorageInput for FileInput {
    fn close(&mut self) -> Result<()> {
        // The file is closed when the reader is dropped.
        Ok(())
    }
}

/// A file output implementation.
#[derive(Debug)]
pub struct FileOutput {
    writer: BufWriter<File>,
    sync_writes: bool,
}

impl FileOutput {
    fn new(file: File, buffer_size: usize, sync_writes: bool) -> Self {
        FileOutput {
            writer: BufWriter::with_capacity(buffer_size, file),
            sync_writes,
        }
    }

    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| StorageError::IoError(format!("Failed to flush: {e}")))?;

        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| StorageError::IoError(format!("Failed to sync: {e}")))?;

        Ok(())
    }
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes_written = self.writer.write(buf)?;

        if self.sync_writes {
            self.writer.flush()?;
        }

        Ok(bytes_written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn close(&mut self) -> Result<()> {
        self.flush_and_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("model");
        let storage = FileStorage::new(&nested, StorageConfig::default()).unwrap();

        assert!(nested.is_dir());
        assert_eq!(storage.directory(), nested.as_path());
    }

    #[test]
    fn test_rejects_file_as_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain");
        std::fs::write(&path, b"x").unwrap();

        assert!(FileStorage::new(&path, StorageConfig::default()).is_err());
    }

    #[test]
    fn test_create_and_read_file() {
        let (_temp_dir, storage) = create_test_storage();

        let mut output = storage.create_output("test.json").unwrap();
        output.write_all(b"{\"ok\": true}").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("test.json").unwrap();
        let mut buffer = String::new();
        input.read_to_string(&mut buffer).unwrap();

        assert_eq!(buffer, "{\"ok\": true}");
        assert_eq!(storage.file_size("test.json").unwrap(), 12);
    }

    #[test]
    fn test_file_operations() {
        let (_temp_dir, storage) = create_test_storage();

        assert!(!storage.file_exists("vectorizer.json"));

        let mut output = storage.create_output("vectorizer.json").unwrap();
        output.write_all(b"Test content").unwrap();
        output.close().unwrap();

        assert!(storage.file_exists("vectorizer.json"));
        assert_eq!(storage.file_size("vectorizer.json").unwrap(), 12);
        assert_eq!(storage.list_files().unwrap(), vec!["vectorizer.json"]);

        storage.rename_file("vectorizer.json", "renamed.json").unwrap();
        assert!(!storage.file_exists("vectorizer.json"));
        assert!(storage.file_exists("renamed.json"));

        storage.delete_file("renamed.json").unwrap();
        assert!(!storage.file_exists("renamed.json"));
        storage.delete_file("renamed.json").unwrap();
    }

    #[test]
    fn test_rename_replaces_target() {
        let (_temp_dir, storage) = create_test_storage();

        for (name, body) in [("a", b"old"), ("b", b"new")] {
            let mut output = storage.create_output(name).unwrap();
            output.write_all(body).unwrap();
            output.close().unwrap();
        }

        storage.rename_file("b", "a").unwrap();
        let mut content = String::new();
        storage.open_input("a").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "new");
        assert_eq!(storage.list_files().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_temp_file_creation() {
        let (_temp_dir, storage) = create_test_storage();

        let (first, mut output) = storage.create_temp_output("classifier").unwrap();
        output.write_all(b"Temporary content").unwrap();
        output.close().unwrap();

        assert_eq!(first, "classifier_0.tmp");
        assert_eq!(storage.file_size(&first).unwrap(), 17);

        let (second, _) = storage.create_temp_output("classifier").unwrap();
        assert_eq!(second, "classifier_1.tmp");
    }

    #[test]
    fn test_file_not_found() {
        let (_temp_dir, storage) = create_test_storage();

        assert!(matches!(
            storage.open_input("missing.json"),
            Err(GuidebotError::Storage(StorageError::FileNotFound(_)))
        ));
        assert!(storage.file_size("missing.json").is_err());
    }

    #[test]
    fn test_storage_close() {
        let (_temp_dir, mut storage) = create_test_storage();

        storage.close().unwrap();
        assert!(matches!(
            storage.create_output("test.json"),
            Err(GuidebotError::Storage(StorageError::StorageClosed))
        ));
        assert!(!storage.file_exists("test.json"));
    }
}
