use crate::error::XlsxError;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use url::Url;

/// Resolves a package location to a local file path.
///
/// Accepts plain paths and `file:` URLs. Any other URL scheme is rejected,
/// since fetching remote packages is left to the caller.
pub(crate) fn resolve_location(location: &str) -> Result<PathBuf, XlsxError> {
    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| XlsxError::UnsupportedLocation(location.to_owned())),
        // Single letter schemes are Windows drive letters ("C:\book.xlsx")
        Ok(url) if url.scheme().len() > 1 => Err(XlsxError::UnsupportedLocation(location.to_owned())),
        _ => Ok(PathBuf::from(location)),
    }
}

/// Opens a package location for buffered reading.
pub(crate) fn open_location(location: &str) -> Result<BufReader<File>, XlsxError> {
    let path = resolve_location(location)?;
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_local_paths() {
        assert_eq!(resolve_location("test.xlsx").unwrap(), PathBuf::from("test.xlsx"));
        assert_eq!(resolve_location("./relative/test.xlsx").unwrap(), PathBuf::from("./relative/test.xlsx"));
        assert_eq!(resolve_location("C:\\data\\test.xlsx").unwrap(), PathBuf::from("C:\\data\\test.xlsx"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_file_url() {
        assert_eq!(resolve_location("file:///tmp/test.xlsx").unwrap(), PathBuf::from("/tmp/test.xlsx"));
    }

    #[test]
    fn test_reject_remote_urls() {
        assert!(matches!(resolve_location("https://example.com/test.xlsx"), Err(XlsxError::UnsupportedLocation(_))));
        assert!(matches!(resolve_location("s3://bucket/test.xlsx"), Err(XlsxError::UnsupportedLocation(_))));
    }

    #[test]
    fn test_open_local_file() {
        assert!(open_location("Cargo.toml").is_ok());
        assert!(matches!(open_location("non_existent_file.xlsx"), Err(XlsxError::IoError(_))));
    }
}
