use std::{ffi::OsString, io::ErrorKind, path::Path};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

/// Replaces the contents of a file in one step. The data goes into a sibling temporary file that
/// is then renamed over the target, so readers never see a half written file.
pub async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), io::Error> {
    let mut temp_name = OsString::from(".");
    temp_name.push(path.file_name().unwrap_or_default());
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, path).await
}

/// Reads a JSON document. A missing file is treated as the default value.
pub async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Reads a file holding one JSON value per line. Lines that can't be parsed are skipped, and a
/// missing file reads as empty.
pub async fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, io::Error> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e),
    };
    debug!("Reading {path:?}");
    let mut lines = BufReader::new(file).lines();
    let mut values = vec![];
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(v) => values.push(v),
            Err(e) => {
                // An interrupted write leaves a broken last line behind.
                warn!("During parsing in path {path:?} found illegal json string {line}: {e}")
            }
        }
    }
    Ok(values)
}

/// Appends one JSON value as a new line.
pub async fn append_json_line<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut buffer = serde_json::to_vec(value)?;
    buffer.push(b'\n');
    let mut file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&buffer).await?;
    file.flush().await?;
    Ok(())
}

/// Serializes values one per line.
pub fn to_json_lines<'a, T: Serialize + 'a>(
    values: impl IntoIterator<Item = &'a T>,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::<u8>::new();
    for value in values {
        serde_json::to_writer(&mut buffer, value)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use serde::{Deserialize, Serialize};
    use tempfile::{tempdir, NamedTempFile};

    use super::{append_json_line, read_json, read_json_lines, to_json_lines, write_atomically};

    #[derive(Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
    struct Entry {
        value: u32,
    }

    #[tokio::test]
    async fn test_write_atomically_replaces_contents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data.json");

        write_atomically(&path, b"{\"value\":1}").await?;
        write_atomically(&path, b"{\"value\":2}").await?;

        let entry: Entry = read_json(&path).await?;
        assert_eq!(entry, Entry { value: 2 });
        // only the target is left behind
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_json_missing_is_default() -> Result<()> {
        let dir = tempdir()?;
        let entry: Entry = read_json(&dir.path().join("missing.json")).await?;
        assert_eq!(entry, Entry::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_json_lines_skips_broken_lines() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{{\"value\":1}}\n{{\"val\n\n{{\"value\":3}}\n")?;

        let values: Vec<Entry> = read_json_lines(file.path()).await?;
        assert_eq!(values, vec![Entry { value: 1 }, Entry { value: 3 }]);
        Ok(())
    }

    #[tokio::test]
    async fn test_append_json_line() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("lines.jsonl");

        append_json_line(&path, &Entry { value: 1 }).await?;
        append_json_line(&path, &Entry { value: 2 }).await?;

        let values: Vec<Entry> = read_json_lines(&path).await?;
        assert_eq!(values, vec![Entry { value: 1 }, Entry { value: 2 }]);

        let bytes = to_json_lines(&values)?;
        assert_eq!(std::fs::read(&path)?, bytes);
        Ok(())
    }
}
