use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::predict::error::PredictError;
use crate::predict::satellite_id::SatelliteId;
use crate::predict::tle_loader::{parse_satellites, Satellite};

pub const DEFAULT_BASE_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a loaded element set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

/// Element sets fetched from CelesTrak, one cache file per query.
pub struct ElementCache {
    cache_dir: PathBuf,
    base_url: String,
}

impl ElementCache {
    pub fn new(cache_dir: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            cache_dir,
            base_url: base_url.into(),
        }
    }

    pub fn cache_path(&self, id: &SatelliteId) -> PathBuf {
        self.cache_dir
            .join(format!("{}-{}.txt", id.query_kind(), id.query_value()))
    }

    pub fn url(&self, id: &SatelliteId) -> String {
        format!(
            "{}?{}={}&FORMAT=TLE",
            self.base_url,
            id.query_kind(),
            id.query_value()
        )
    }

    /// All element sets returned for the query behind `id`.
    ///
    /// The cache file is used unless it is missing, empty, or `reload` is set.
    pub fn load_elements(
        &self,
        id: &SatelliteId,
        reload: bool,
    ) -> Result<(Vec<Satellite>, Origin), PredictError> {
        let path = self.cache_path(id);
        if reload || !file_exists_and_not_empty(&path) {
            let satellites = self.download(id, &path)?;
            return Ok((satellites, Origin::Network));
        }

        log::debug!("Using cached elements {}", path.display());
        let content = fs::read_to_string(&path)?;
        let source = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let satellites = parse_satellites(&content, &source)?;
        Ok((satellites, Origin::Cache))
    }

    /// Fetch and parse the element sets for `id`, caching them only when
    /// the answer holds at least one.
    fn download(&self, id: &SatelliteId, path: &Path) -> Result<Vec<Satellite>, PredictError> {
        let url = self.url(id);
        let fetch_err = |message: String| PredictError::Fetch {
            url: url.clone(),
            message,
        };

        log::info!("Downloading elements from {}", url);

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| fetch_err(e.to_string()))?;
        let response = client
            .get(&url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("status {}", response.status())));
        }
        let body = response.bytes().map_err(|e| fetch_err(e.to_string()))?;

        // CelesTrak answers unknown objects with 200 and a "No GP data found" body.
        let satellites = parse_satellites(&String::from_utf8_lossy(&body), &url)?;
        if satellites.is_empty() {
            log::debug!("{} returned no element sets", url);
            return Err(PredictError::SatelliteNotFound(id.to_string()));
        }

        fs::create_dir_all(&self.cache_dir)?;
        // An interrupted download must not clobber a good cache file.
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &body)?;
        fs::rename(&temp_path, path)?;
        Ok(satellites)
    }
}

/// Pick the satellite `id` refers to among those returned for its query.
pub fn select(mut satellites: Vec<Satellite>, id: &SatelliteId) -> Result<Satellite, PredictError> {
    let offset = id.offset();
    if offset >= satellites.len() {
        return Err(PredictError::SatelliteNotFound(id.to_string()));
    }
    Ok(satellites.swap_remove(offset))
}

fn file_exists_and_not_empty(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::tle_loader::tests::ISS_TLE;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    /// Answer a single HTTP request with `200 OK` and `body`; returns the base URL.
    fn serve_once(body: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/gp.php", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
        });
        (url, handle)
    }

    fn cache(dir: &TempDir) -> ElementCache {
        ElementCache::new(dir.path().to_path_buf(), DEFAULT_BASE_URL)
    }

    #[test]
    fn names_cache_files_after_the_query() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let norad = SatelliteId::parse("25544").unwrap();
        let intl = SatelliteId::parse("2017-073C").unwrap();
        assert_eq!(cache.cache_path(&norad), dir.path().join("CATNR-25544.txt"));
        assert_eq!(cache.cache_path(&intl), dir.path().join("INTDES-2017-073.txt"));
        assert_eq!(
            cache.url(&intl),
            "https://celestrak.org/NORAD/elements/gp.php?INTDES=2017-073&FORMAT=TLE"
        );
    }

    #[test]
    fn reads_from_cache_without_network() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let id = SatelliteId::parse("25544").unwrap();
        fs::write(cache.cache_path(&id), ISS_TLE).unwrap();

        let (satellites, origin) = cache.load_elements(&id, false).unwrap();
        assert_eq!(origin, Origin::Cache);
        assert_eq!(satellites.len(), 1);
        assert_eq!(satellites[0].norad_id, 25544);
    }

    #[test]
    fn failed_download_is_fatal() {
        let dir = TempDir::new().unwrap();
        // Nothing listens on the discard port.
        let cache = ElementCache::new(dir.path().to_path_buf(), "http://127.0.0.1:9/gp.php");
        let id = SatelliteId::parse("25544").unwrap();
        let err = cache.load_elements(&id, false).unwrap_err();
        assert!(matches!(err, PredictError::Fetch { .. }));
        assert!(!cache.cache_path(&id).exists());
    }

    #[test]
    fn unknown_object_is_not_found_and_not_cached() {
        let dir = TempDir::new().unwrap();
        let (url, server) = serve_once("No GP data found");
        let cache = ElementCache::new(dir.path().to_path_buf(), url);
        let id = SatelliteId::parse("99999").unwrap();

        let err = cache.load_elements(&id, false).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, PredictError::SatelliteNotFound(_)));
        assert!(!cache.cache_path(&id).exists());
        assert!(!cache.cache_path(&id).with_extension("tmp").exists());
    }

    #[test]
    fn downloaded_elements_are_cached() {
        let dir = TempDir::new().unwrap();
        let (url, server) = serve_once(ISS_TLE);
        let cache = ElementCache::new(dir.path().join("nested"), url);
        let id = SatelliteId::parse("25544").unwrap();

        let (satellites, origin) = cache.load_elements(&id, false).unwrap();
        server.join().unwrap();
        assert_eq!(origin, Origin::Network);
        assert_eq!(satellites[0].norad_id, 25544);
        assert_eq!(fs::read_to_string(cache.cache_path(&id)).unwrap(), ISS_TLE);

        let (_, origin) = cache.load_elements(&id, false).unwrap();
        assert_eq!(origin, Origin::Cache);
    }

    #[test]
    fn piece_letter_out_of_range_is_not_found() {
        let id = SatelliteId::parse("1998-067B").unwrap();
        let satellites = parse_satellites(ISS_TLE, "test").unwrap();
        let err = select(satellites, &id).unwrap_err();
        assert!(matches!(err, PredictError::SatelliteNotFound(_)));

        let id = SatelliteId::parse("1998-067A").unwrap();
        let satellites = parse_satellites(ISS_TLE, "test").unwrap();
        assert_eq!(select(satellites, &id).unwrap().norad_id, 25544);
    }

    #[test]
    fn empty_result_is_not_found() {
        let id = SatelliteId::parse("99999").unwrap();
        assert!(matches!(
            select(Vec::new(), &id),
            Err(PredictError::SatelliteNotFound(_))
        ));
    }
}
