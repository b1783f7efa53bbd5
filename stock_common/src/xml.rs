//! XML documents for the broadcast-graphics consumer.
//!
//! Two shapes are produced from a watch-list:
//!
//! - `StockData`: one `<Stock>` element per entry with symbol, name, price,
//!   change and percent change (2, 2 and 3 decimals).
//! - `Ticker`: a single `<TickerText>` line meant for scrolling display, entries
//!   formatted as `SYMBOL - NAME | PRICE (±CHANGE)` and separated by four spaces.
//!
//! Generation is pure: the only input besides the entries is the timestamp,
//! which [`generate_xml`] takes from the clock and [`generate_xml_at`] accepts
//! explicitly.
use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::model::WatchlistEntry;
use crate::model::lenient::finite_or_zero;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const TICKER_SEPARATOR: &str = "    ";

/// Output shape of the generated document.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum XmlFormat {
    /// Structured per-stock document.
    #[default]
    StockData,
    /// Single-line scrolling text.
    Ticker,
}

impl XmlFormat {
    /// Fixed file name the server materializes this shape to.
    pub fn file_name(&self) -> &'static str {
        match self {
            XmlFormat::StockData => "cinegy_stocks.xml",
            XmlFormat::Ticker => "cinegy_ticker.xml",
        }
    }

    /// Dated file name used for local downloads, e.g. `cinegy_stocks_2024-05-01.xml`.
    pub fn download_file_name(&self, at: DateTime<Utc>) -> String {
        let stem = self.file_name().trim_end_matches(".xml");
        format!("{}_{}.xml", stem, at.format("%Y-%m-%d"))
    }

    /// Renders `entries` in this shape.
    pub fn render(&self, entries: &[WatchlistEntry]) -> String {
        match self {
            XmlFormat::StockData => generate_xml(entries),
            XmlFormat::Ticker => generate_ticker_xml(entries),
        }
    }
}

/// Escape the five XML metacharacters `& < > " '`.
///
/// Characters XML 1.0 does not allow at all (control characters other than
/// tab, newline and carriage return, `U+FFFE`, `U+FFFF`) are dropped.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return quick_xml::escape::escape(text);
    }
    let allowed: String = text.chars().filter(|c| is_xml_char(*c)).collect();
    Cow::Owned(quick_xml::escape::escape(&allowed).into_owned())
}

/// `true` for characters matched by the XML 1.0 `Char` production.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Structured `StockData` document stamped with the current time.
pub fn generate_xml(entries: &[WatchlistEntry]) -> String {
    generate_xml_at(entries, Utc::now())
}

/// Structured `StockData` document stamped with `timestamp`.
pub fn generate_xml_at(entries: &[WatchlistEntry], timestamp: DateTime<Utc>) -> String {
    let mut xml = String::with_capacity(128 + entries.len() * 160);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(
        "<StockData timestamp=\"{}\">\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));

    for entry in entries {
        xml.push_str("  <Stock>\n");
        xml.push_str(&format!("    <Symbol>{}</Symbol>\n", escape_xml(entry.symbol())));
        xml.push_str(&format!("    <Name>{}</Name>\n", escape_xml(&entry.record.name)));
        xml.push_str(&format!("    <Price>{:.2}</Price>\n", finite_or_zero(entry.price)));
        xml.push_str(&format!("    <Change>{:.2}</Change>\n", finite_or_zero(entry.change)));
        xml.push_str(&format!(
            "    <ChangePercent>{:.3}</ChangePercent>\n",
            finite_or_zero(entry.percent_change)
        ));
        xml.push_str("  </Stock>\n");
    }

    xml.push_str("</StockData>");
    xml
}

/// Single-line `Ticker` document.
pub fn generate_ticker_xml(entries: &[WatchlistEntry]) -> String {
    let text = entries
        .iter()
        .map(ticker_item)
        .collect::<Vec<_>>()
        .join(TICKER_SEPARATOR);

    format!(
        "{}\n<Ticker>\n  <TickerText>{}</TickerText>\n</Ticker>",
        XML_DECLARATION, text
    )
}

/// `SYMBOL - NAME | PRICE (±CHANGE)`, escaped.
fn ticker_item(entry: &WatchlistEntry) -> String {
    let change = finite_or_zero(entry.change);
    let sign = if change >= 0.0 { "+" } else { "" };
    format!(
        "{} - {} | {:.2} ({}{:.2})",
        escape_xml(entry.symbol()),
        escape_xml(&entry.record.name),
        finite_or_zero(entry.price),
        sign,
        change
    )
}
