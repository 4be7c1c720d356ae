//! Collision CSV loader.
//!
//! Reads the cleaned dataset into a [`CollisionTable`]: header names and the
//! County, Municipality and Species cells are trimmed, and calendar columns
//! are derived from `Time` when the file does not already carry them.

use std::path::PathBuf;

use chrono::{Datelike as _, Timelike as _};
use csv::StringRecord;
use wildlife_risk_collision_models::{CollisionRecord, columns, weekday_name};

use crate::config::DataConfig;
use crate::parsing::{non_blank, parse_date, parse_float, parse_int, parse_timestamp};
use crate::{CollisionTable, LoadError};

/// Calendar columns derived from `Time`, in the order they are appended.
const DERIVED_COLUMNS: [&str; 6] = [
    columns::YEAR,
    columns::MONTH,
    columns::HOUR,
    columns::DAY_OF_YEAR,
    columns::DATE,
    columns::WEEKDAY,
];

/// Returns the path of a local copy of the dataset, downloading it from
/// the configured URL first if the file is missing.
///
/// # Errors
///
/// Returns [`LoadError::Missing`] if the file is absent and no URL is
/// configured, or [`LoadError::Fetch`] if the download fails.
pub async fn ensure_local(config: &DataConfig) -> Result<PathBuf, LoadError> {
    let path = config.local_path.clone();
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(path);
    }

    let Some(url) = config.remote_url.as_deref() else {
        return Err(LoadError::Missing {
            location: path.display().to_string(),
        });
    };

    log::info!("{} is missing, fetching {url}", path.display());
    wildlife_risk_fetch::download_file(url, &path, config.timeout)
        .await
        .map_err(|source| LoadError::Fetch {
            location: url.to_owned(),
            source,
        })?;

    Ok(path)
}

/// Loads the full collision table described by `config`.
///
/// # Errors
///
/// Returns [`LoadError`] if the source is unreachable, cannot be decoded or
/// parsed, lacks a required column, or holds no rows.
pub async fn load_collisions(config: &DataConfig) -> Result<CollisionTable, LoadError> {
    let path = ensure_local(config).await?;
    let location = config.location();

    let raw = tokio::fs::read(&path).await.map_err(|source| LoadError::Io {
        location: location.clone(),
        source,
    })?;
    let bytes =
        wildlife_risk_fetch::decompress_if_gz(&path, raw).map_err(|source| LoadError::Io {
            location: location.clone(),
            source,
        })?;
    let text = config
        .encoding
        .decode(&bytes)
        .ok_or_else(|| LoadError::Encoding {
            location: location.clone(),
            encoding: config.encoding,
        })?;

    let table = parse_collisions(&text, &location)?;
    log::info!(
        "Loaded {} collision records ({} columns) from {location}",
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Column positions resolved from the header row.
struct Layout {
    county: usize,
    municipality: usize,
    species: usize,
    time: Option<usize>,
    year: Option<usize>,
    month: Option<usize>,
    hour: Option<usize>,
    day_of_year: Option<usize>,
    date: Option<usize>,
    weekday: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl Layout {
    fn resolve(headers: &[String], location: &str) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                location: location.to_owned(),
                column: name.to_owned(),
            })
        };

        Ok(Self {
            county: require(columns::COUNTY)?,
            municipality: require(columns::MUNICIPALITY)?,
            species: require(columns::SPECIES)?,
            time: find(columns::TIME),
            year: find(columns::YEAR),
            month: find(columns::MONTH),
            hour: find(columns::HOUR),
            day_of_year: find(columns::DAY_OF_YEAR),
            date: find(columns::DATE),
            weekday: find(columns::WEEKDAY),
            latitude: find(columns::LATITUDE),
            longitude: find(columns::LONGITUDE),
        })
    }

    fn record(&self, row: &StringRecord) -> CollisionRecord {
        let cell = |i: usize| row.get(i).unwrap_or("");
        let time = self.time.and_then(|i| parse_timestamp(cell(i)));

        // A column present in the file always wins; otherwise derive from
        // `Time` (which yields `None` when there is no timestamp).
        CollisionRecord {
            species: cell(self.species).trim().to_owned(),
            county: cell(self.county).trim().to_owned(),
            municipality: cell(self.municipality).trim().to_owned(),
            year: self
                .year
                .map_or_else(|| time.map(|t| t.year()), |i| parse_int(cell(i))),
            month: self
                .month
                .map_or_else(|| time.map(|t| t.month()), |i| parse_int(cell(i))),
            hour: self
                .hour
                .map_or_else(|| time.map(|t| t.hour()), |i| parse_int(cell(i))),
            day_of_year: self
                .day_of_year
                .map_or_else(|| time.map(|t| t.ordinal()), |i| parse_int(cell(i))),
            date: self
                .date
                .map_or_else(|| time.map(|t| t.date()), |i| parse_date(cell(i))),
            weekday: self.weekday.map_or_else(
                || time.map(|t| weekday_name(t.weekday()).to_owned()),
                |i| non_blank(cell(i)),
            ),
            latitude: self.latitude.and_then(|i| parse_float(cell(i))),
            longitude: self.longitude.and_then(|i| parse_float(cell(i))),
            time,
        }
    }
}

/// Parses decoded CSV text into a [`CollisionTable`].
///
/// `location` is only used to label errors.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] for malformed CSV,
/// [`LoadError::MissingColumn`] if County, Municipality or Species is
/// absent, and [`LoadError::Empty`] if there are no data rows.
pub fn parse_collisions(text: &str, location: &str) -> Result<CollisionTable, LoadError> {
    let parse_error = |source| LoadError::Parse {
        location: location.to_owned(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let layout = Layout::resolve(&headers, location)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(parse_error)?;
        records.push(layout.record(&row));
    }

    if records.is_empty() {
        return Err(LoadError::Empty {
            location: location.to_owned(),
        });
    }

    let mut table_columns = headers;
    if layout.time.is_some() {
        for name in DERIVED_COLUMNS {
            if !table_columns.iter().any(|c| c == name) {
                table_columns.push(name.to_owned());
            }
        }
    }

    Ok(CollisionTable::new(table_columns, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Encoding;

    const SAMPLE: &str = "\
 County ,Municipality,Species,Time,Lat_WGS84,Long_WGS84
Värmlands län , Sunne ,Moose ,2021-09-14 19:45:00,59.83,13.14
Värmlands län,Torsby,Roe deer,2021-10-02 06:10:00,60.13,12.99
Skåne län,Lund,Wild boar,2022-01-05 22:30:00,,
";

    #[test]
    fn trims_headers_and_text_columns() {
        let table = parse_collisions(SAMPLE, "sample.csv").unwrap();
        assert!(table.has_column("County"));
        let first = &table.records()[0];
        assert_eq!(first.county, "Värmlands län");
        assert_eq!(first.municipality, "Sunne");
        assert_eq!(first.species, "Moose");
    }

    #[test]
    fn derives_calendar_columns_from_time() {
        let table = parse_collisions(SAMPLE, "sample.csv").unwrap();
        for name in DERIVED_COLUMNS {
            assert!(table.has_column(name), "missing derived column {name}");
        }
        let first = &table.records()[0];
        assert_eq!(first.year, Some(2021));
        assert_eq!(first.month, Some(9));
        assert_eq!(first.hour, Some(19));
        assert_eq!(first.day_of_year, Some(257));
        assert_eq!(first.weekday.as_deref(), Some("Tuesday"));
        assert_eq!(first.date.map(|d| d.to_string()).as_deref(), Some("2021-09-14"));
    }

    #[test]
    fn existing_calendar_columns_are_not_overwritten() {
        let csv = "County,Municipality,Species,Time,Month,Hour\n\
                   Skåne län,Lund,Moose,2021-09-14 19:45:00,3,4\n";
        let table = parse_collisions(csv, "sample.csv").unwrap();
        let record = &table.records()[0];
        assert_eq!(record.month, Some(3));
        assert_eq!(record.hour, Some(4));
        assert_eq!(record.year, Some(2021));
        assert_eq!(
            table.columns().iter().filter(|c| *c == "Month").count(),
            1
        );
    }

    #[test]
    fn no_time_column_means_no_derived_columns() {
        let csv = "County,Municipality,Species\nSkåne län,Lund,Moose\n";
        let table = parse_collisions(csv, "sample.csv").unwrap();
        assert_eq!(table.columns(), ["County", "Municipality", "Species"]);
        assert!(table.records()[0].year.is_none());
    }

    #[test]
    fn unparseable_time_leaves_fields_missing() {
        let csv = "County,Municipality,Species,Time\nSkåne län,Lund,Moose,garbage\n";
        let table = parse_collisions(csv, "sample.csv").unwrap();
        let record = &table.records()[0];
        assert!(record.time.is_none());
        assert!(record.month.is_none());
    }

    #[test]
    fn missing_coordinates_are_none() {
        let table = parse_collisions(SAMPLE, "sample.csv").unwrap();
        assert!(table.records()[2].coordinates().is_none());
        assert!(table.records()[0].coordinates().is_some());
    }

    #[test]
    fn header_only_file_is_empty_error() {
        let err = parse_collisions("County,Municipality,Species\n", "empty.csv").unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
        assert_eq!(err.location(), "empty.csv");
    }

    #[test]
    fn missing_required_column_is_error() {
        let err = parse_collisions("County,Species\nSkåne län,Moose\n", "bad.csv").unwrap_err();
        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "Municipality"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_file_without_url_is_load_error() {
        let config = DataConfig::local(
            std::env::temp_dir().join("wildlife_risk_data_test_missing/nope.csv"),
        );
        let err = load_collisions(&config).await.unwrap_err();
        assert!(matches!(err, LoadError::Missing { .. }));
        assert!(err.location().ends_with("nope.csv"));
    }

    #[tokio::test]
    async fn loads_local_file_with_county_column() {
        let tmp = std::env::temp_dir().join("wildlife_risk_data_test_local");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("cleaned_data.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = load_collisions(&DataConfig::local(&path)).await.unwrap();
        assert!(!table.is_empty());
        assert!(table.has_column("County"));
        assert_eq!(table.len(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn loads_cp1252_gzip_file() {
        use std::io::Write as _;

        let tmp = std::env::temp_dir().join("wildlife_risk_data_test_gzip");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("cleaned_data.csv.gz");

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(b"County,Municipality,Species\nSk\xe5ne l\xe4n,H\xf6\xf6r,Moose\n")
            .unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let encoding = Encoding::for_label("cp1252").unwrap();
        let config = DataConfig::local(&path).with_encoding(encoding);
        let table = load_collisions(&config).await.unwrap();
        assert_eq!(table.records()[0].county, "Skåne län");
        assert_eq!(table.records()[0].municipality, "Höör");

        let utf8 = DataConfig::local(&path);
        let err = load_collisions(&utf8).await.unwrap_err();
        assert!(matches!(err, LoadError::Encoding { .. }), "{err}");
        assert!(err.to_string().contains("UTF-8"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unreachable_url_is_load_error_with_location() {
        let tmp = std::env::temp_dir().join("wildlife_risk_data_test_unreachable");
        let _ = std::fs::remove_dir_all(&tmp);
        let mut config = DataConfig::local(tmp.join("cleaned_data.csv"))
            .with_remote_url("http://127.0.0.1:9/cleaned_data.csv");
        config.timeout = std::time::Duration::from_secs(2);

        let err = load_collisions(&config).await.unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
        assert_eq!(err.location(), "http://127.0.0.1:9/cleaned_data.csv");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn downloads_missing_file_once_and_reuses_cache() {
        use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/cleaned_data.csv", listener.local_addr().unwrap());
        let body = SAMPLE.as_bytes();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0_u8; 4096];
            let _ = socket.read(&mut request).await.unwrap();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let tmp = std::env::temp_dir().join("wildlife_risk_data_test_download");
        let _ = std::fs::remove_dir_all(&tmp);
        let cache = tmp.join("cleaned_data.csv");
        let config = DataConfig::local(&cache).with_remote_url(&url);

        let table = load_collisions(&config).await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[1].municipality, "Torsby");
        assert!(cache.exists());
        assert!(!wildlife_risk_fetch::partial_path(&cache).exists());

        // The listener accepted a single connection, so the second load must
        // be served from the cached file.
        let again = load_collisions(&config).await.unwrap();
        assert_eq!(again.len(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
