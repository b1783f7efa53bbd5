//! Destinations for the rendered XML document.
//!
//! `FileExporter` writes a dated file locally. `ServerExporter` hands the
//! entries to the export server, which materializes the document under its
//! public directory.
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use stock_common::net::XML_ROUTE;
use stock_common::{Result, StockError, WatchlistEntry, XmlFormat};

const NO_STOCKS: &str = "No stocks provided";

/// Something that can publish a watch-list as XML.
pub trait Exporter: Send + Sync {
    /// Publish `entries` and return where the document ended up.
    fn export(&self, entries: &[WatchlistEntry]) -> Result<String>;
}

/// Writes `<stem>_YYYY-MM-DD.xml` into a local directory.
#[derive(Debug, Clone)]
pub struct FileExporter {
    out_dir: PathBuf,
    format: XmlFormat,
}

impl FileExporter {
    /// Exporter writing `format` documents into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>, format: XmlFormat) -> Self {
        Self {
            out_dir: out_dir.into(),
            format,
        }
    }
}

impl Exporter for FileExporter {
    fn export(&self, entries: &[WatchlistEntry]) -> Result<String> {
        if entries.is_empty() {
            return Err(StockError::Validation(NO_STOCKS.to_string()));
        }
        let path = self
            .out_dir
            .join(self.format.download_file_name(Utc::now()));
        fs::create_dir_all(&self.out_dir)?;
        fs::write(&path, self.format.render(entries))?;
        info!("Wrote {} stocks to {}", entries.len(), path.display());
        Ok(path.display().to_string())
    }
}

#[derive(Serialize)]
struct ExportRequest<'a> {
    stocks: &'a [WatchlistEntry],
    format: XmlFormat,
}

#[derive(Deserialize)]
struct ExportReply {
    #[serde(default)]
    path: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// Posts the entries to a running export server.
#[derive(Debug, Clone)]
pub struct ServerExporter {
    client: reqwest::blocking::Client,
    base_url: String,
    format: XmlFormat,
}

impl ServerExporter {
    /// Exporter targeting the server at `base_url`, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str, format: XmlFormat) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            format,
        })
    }
}

impl Exporter for ServerExporter {
    fn export(&self, entries: &[WatchlistEntry]) -> Result<String> {
        if entries.is_empty() {
            return Err(StockError::Validation(NO_STOCKS.to_string()));
        }
        let url = format!("{}{}", self.base_url, XML_ROUTE);
        debug!("POST {} with {} stocks", url, entries.len());

        let response = self
            .client
            .post(&url)
            .json(&ExportRequest {
                stocks: entries,
                format: self.format,
            })
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorReply>(&body)
                .map(|reply| reply.error)
                .unwrap_or(body);
            return Err(StockError::UpstreamUnavailable(format!(
                "Export server returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let reply: ExportReply = serde_json::from_str(&body)?;
        let location = format!("{}{}", self.base_url, reply.path);
        info!("Server wrote {} stocks to {}", entries.len(), location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use stock_common::SymbolRecord;

    fn entries() -> Vec<WatchlistEntry> {
        let mut aapl = WatchlistEntry::new(SymbolRecord::new("AAPL", "Apple Inc"));
        aapl.price = 150.5;
        aapl.change = 2.25;
        aapl.percent_change = 1.5;
        vec![aapl]
    }

    /// Answers one request with `status` and `body`, returning the request body.
    fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            reader.get_mut().write_all(reply.as_bytes()).unwrap();
            String::from_utf8(request_body).unwrap()
        });
        (url, handle)
    }

    #[test]
    fn file_exporter_writes_dated_document() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().join("out"), XmlFormat::StockData);

        let written = exporter.export(&entries()).unwrap();
        let expected = dir
            .path()
            .join("out")
            .join(XmlFormat::StockData.download_file_name(Utc::now()));
        assert_eq!(written, expected.display().to_string());

        let xml = fs::read_to_string(expected).unwrap();
        assert!(xml.contains("<Symbol>AAPL</Symbol>"));
        assert!(xml.contains("<Price>150.50</Price>"));
    }

    #[test]
    fn file_exporter_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path(), XmlFormat::Ticker);
        let err = exporter.export(&[]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn server_exporter_posts_entries_and_returns_location() {
        let (url, server) = one_shot_server(
            "200 OK",
            r#"{"success":true,"path":"/cinegy_ticker.xml"}"#,
        );
        let exporter = ServerExporter::new(&format!("{}/", url), XmlFormat::Ticker).unwrap();

        let location = exporter.export(&entries()).unwrap();
        assert_eq!(location, format!("{}/cinegy_ticker.xml", url));

        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent["format"], "ticker");
        assert_eq!(sent["stocks"][0]["symbol"], "AAPL");
        assert_eq!(sent["stocks"][0]["percentChange"], 1.5);
    }

    #[test]
    fn server_error_message_is_surfaced() {
        let (url, server) = one_shot_server(
            "500 Internal Server Error",
            r#"{"error":"Failed to write file"}"#,
        );
        let exporter = ServerExporter::new(&url, XmlFormat::StockData).unwrap();

        let err = exporter.export(&entries()).unwrap_err();
        server.join().unwrap();
        match err {
            StockError::UpstreamUnavailable(message) => {
                assert!(message.contains("500"), "{}", message);
                assert!(message.contains("Failed to write file"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn server_exporter_rejects_empty_list_without_a_request() {
        let exporter = ServerExporter::new("http://127.0.0.1:9", XmlFormat::StockData).unwrap();
        assert!(exporter.export(&[]).unwrap_err().is_validation());
    }
}
