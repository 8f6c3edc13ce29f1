use crate::{event::EventCollection, timestamp::TimestampSource, EventError, Result};
use serde_json::Value;
use std::{fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::debug;

/// Default name of the document's field with events list.
pub const DEFAULT_LIST_FIELD: &str = "Races";
/// Default timeout of the HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the schedule document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLocation {
    /// Local file.
    File(PathBuf),
    /// HTTP(S) URL.
    Url(String),
}

impl FromStr for SourceLocation {
    type Err = EventError;

    /// `http://` and `https://` locations are URLs, everything else is a path.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            Err(EventError::InvalidSource("empty location".to_owned()))
        } else if s.starts_with("http://") || s.starts_with("https://") {
            Ok(SourceLocation::Url(s.to_owned()))
        } else if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                Err(EventError::InvalidSource(s.to_owned()))
            } else {
                Ok(SourceLocation::File(PathBuf::from(path)))
            }
        } else {
            Ok(SourceLocation::File(PathBuf::from(s)))
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Parses schedule document `text` into events collection.
///
/// Document is either a JSON array of records or a JSON object with the array in `list_field`.
pub fn parse_document(text: &str, list_field: &str, timestamp: &TimestampSource) -> Result<EventCollection> {
    let document: Value = serde_json::from_str(text).map_err(|e| EventError::InvalidDocument(e.to_string()))?;

    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove(list_field) {
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(EventError::InvalidDocument(format!(
                    "field `{list_field}` isn't a list"
                )))
            }
            None => return Err(EventError::InvalidDocument(format!("missing field `{list_field}`"))),
        },
        _ => {
            return Err(EventError::InvalidDocument(
                "expected JSON object or array".to_owned(),
            ))
        }
    };

    Ok(EventCollection::from_records(records, timestamp))
}

/// Schedule document loader.
#[derive(Debug, Clone)]
pub struct Source {
    location: SourceLocation,
    list_field: String,
    timestamp: TimestampSource,
    #[cfg(feature = "async")]
    client: reqwest::Client,
}

impl Source {
    /// Constructs loader of the `location` with default list field, timestamp field and timeout.
    pub fn new(location: SourceLocation) -> Result<Self> {
        Ok(Self {
            location,
            list_field: DEFAULT_LIST_FIELD.to_owned(),
            timestamp: TimestampSource::default(),
            #[cfg(feature = "async")]
            client: http_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Sets name of the events list field.
    pub fn with_list_field(mut self, list_field: impl Into<String>) -> Self {
        self.list_field = list_field.into();
        self
    }

    /// Sets where the timestamp lives inside the event record.
    pub fn with_timestamp(mut self, timestamp: TimestampSource) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets timeout of the HTTP request.
    #[cfg(feature = "async")]
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Replaces the HTTP client, i.e. to use custom proxy or TLS settings.
    #[cfg(feature = "async")]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns source location.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Returns where the timestamp lives inside the event record.
    pub fn timestamp(&self) -> &TimestampSource {
        &self.timestamp
    }

    /// Loads the document synchronously.
    ///
    /// Only [`SourceLocation::File`] is supported, URLs require async [`load`](Source::load).
    pub fn load_blocking(&self) -> Result<EventCollection> {
        match &self.location {
            SourceLocation::File(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| EventError::SourceRead(format!("{}: {e}", path.display())))?;
                self.parse(&text)
            }
            SourceLocation::Url(url) => Err(EventError::InvalidSource(format!(
                "{url}: HTTP source can't be loaded synchronously"
            ))),
        }
    }

    /// Reads the file or fetches the URL and parses the document.
    #[cfg(feature = "async")]
    pub async fn load(&self) -> Result<EventCollection> {
        let text = match &self.location {
            SourceLocation::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| EventError::SourceRead(format!("{}: {e}", path.display())))?,
            SourceLocation::Url(url) => fetch_text(&self.client, url).await?,
        };

        self.parse(&text)
    }

    fn parse(&self, text: &str) -> Result<EventCollection> {
        let events = parse_document(text, &self.list_field, &self.timestamp)?;
        debug!(source = %self.location, events = events.len(), "schedule loaded");
        Ok(events)
    }
}

#[cfg(feature = "async")]
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// GETs `url` and returns the body, non-success statuses are errors.
#[cfg(feature = "async")]
pub(crate) async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(EventError::Fetch(format!("{url}: HTTP status {status}")));
    }
    Ok(response.text().await?)
}
