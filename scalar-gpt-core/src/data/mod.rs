//! Corpus loading.
//!
//! A corpus is a list of short documents (e.g. one name per line). [`DataLoader`] is the
//! seam; [`PathLoader`] reads a local file.

mod error;
mod impls;
mod types;

pub use error::DataError;
pub use impls::{load_from_path, PathLoader};
pub use types::{Data, DataItem};

/// Source of training documents.
pub trait DataLoader {
    /// Loads the corpus.
    ///
    /// # Errors
    ///
    /// Implementation specific; see [`DataError`].
    fn load(&self) -> Result<Data, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as _;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn write_temp(name: &str, lines: &[&str]) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f.sync_all().unwrap();
        path
    }

    #[test]
    fn load_trims_lines() {
        let path = write_temp("scalar_gpt_data_lines.txt", &["emma", "  olivia  ", "ava"]);
        let result = load_from_path(&path);
        let _ = std::fs::remove_file(&path);
        let data = result.unwrap();
        assert_eq!(data.lines(), ["emma", "olivia", "ava"]);
        assert_eq!(data.corpus(), "emmaoliviaava");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let path = write_temp("scalar_gpt_data_blank.txt", &["first", "   ", "", "third"]);
        let result = load_from_path(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(result.unwrap().lines(), ["first", "third"]);
    }

    #[test]
    fn whitespace_only_file_is_empty() {
        let path = write_temp("scalar_gpt_data_ws.txt", &["   ", ""]);
        let result = load_from_path(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(DataError::NoDocuments)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let loader = PathLoader::new(Path::new("/nonexistent/scalar_gpt_never_exists.txt"));
        let err = loader.load().unwrap_err();
        assert!(matches!(&err, DataError::Read { path, .. } if path.ends_with("scalar_gpt_never_exists.txt")));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("data: cannot read /nonexistent/"));
    }

    #[test]
    fn data_item_rejects_blank() {
        assert!(matches!(DataItem::new("  "), Err(DataError::BlankDocument)));
        assert_eq!(DataItem::new("  world ").unwrap().as_str(), "world");
        assert!(matches!(Data::new(vec![]), Err(DataError::NoDocuments)));
    }

    #[test]
    fn shuffle_is_seeded_and_keeps_documents() {
        let items: Vec<DataItem> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|s| DataItem::new(s).unwrap())
            .collect();
        let mut x = Data::new(items.clone()).unwrap();
        let mut y = Data::new(items).unwrap();
        x.shuffle(&mut StdRng::seed_from_u64(1));
        y.shuffle(&mut StdRng::seed_from_u64(1));
        assert_eq!(x.lines(), y.lines());
        let mut sorted = x.lines();
        sorted.sort_unstable();
        assert_eq!(sorted, ["a", "b", "c", "d", "e", "f"]);
    }
}
