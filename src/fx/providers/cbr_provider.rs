use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::fx::fx_errors::{FxError, Result};
use crate::fx::fx_model::NewCurrencyRate;

use super::rate_provider::RateProvider;

const CBR_DAILY_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";
const SOURCE_NAME: &str = "cbr.ru";
const DERIVED_SOURCE_NAME: &str = "derived:cbr.ru";
const MAX_BULLETIN_PROBES: usize = 7;

lazy_static! {
    static ref BULLETIN_DATE_RE: Regex =
        Regex::new(r#"Date="(\d{2})\.(\d{2})\.(\d{4})""#).expect("valid regex");
    static ref VALUTE_RE: Regex =
        Regex::new(r"(?s)<Valute[^>]*>(.*?)</Valute>").expect("valid regex");
    static ref CHAR_CODE_RE: Regex =
        Regex::new(r"<CharCode>([A-Z]{3})</CharCode>").expect("valid regex");
    static ref NOMINAL_RE: Regex = Regex::new(r"<Nominal>(\d+)</Nominal>").expect("valid regex");
    static ref VALUE_RE: Regex = Regex::new(r"<Value>([\d,\.]+)</Value>").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq)]
struct CbrQuote {
    nominal: Decimal,
    value: Decimal,
}

impl CbrQuote {
    /// The bulletin quotes `nominal` units of the currency in roubles.
    fn unit_rate(&self) -> Option<Decimal> {
        if self.nominal.is_zero() {
            return None;
        }
        Some(self.value / self.nominal)
    }
}

#[derive(Debug)]
struct CbrBulletin {
    date: NaiveDate,
    quotes: HashMap<String, CbrQuote>,
}

/// Daily exchange rates published by the Central Bank of Russia. Rates are
/// quoted against the rouble; the EUR/USD cross is derived from the same
/// bulletin.
pub struct CbrProvider {
    client: reqwest::Client,
    base_url: String,
    base_currencies: Vec<String>,
    target_currency: String,
}

impl Default for CbrProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CbrProvider {
    pub fn new() -> Self {
        Self::with_base_url(CBR_DAILY_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            base_currencies: vec!["USD".to_string(), "EUR".to_string()],
            target_currency: "RUB".to_string(),
        }
    }

    fn rates_for_date(&self, store_date: NaiveDate, bulletin: &CbrBulletin) -> Vec<NewCurrencyRate> {
        let mut rates = Vec::new();

        for code in &self.base_currencies {
            let Some(unit_rate) = bulletin.quotes.get(code).and_then(CbrQuote::unit_rate) else {
                continue;
            };
            rates.push(NewCurrencyRate {
                date: store_date,
                base_currency: code.clone(),
                target_currency: self.target_currency.clone(),
                rate: unit_rate,
                source: SOURCE_NAME.to_string(),
            });
        }

        let usd = bulletin.quotes.get("USD").and_then(CbrQuote::unit_rate);
        let eur = bulletin.quotes.get("EUR").and_then(CbrQuote::unit_rate);
        if let (Some(usd_rate), Some(eur_rate)) = (usd, eur) {
            if !usd_rate.is_zero() {
                rates.push(NewCurrencyRate {
                    date: store_date,
                    base_currency: "EUR".to_string(),
                    target_currency: "USD".to_string(),
                    rate: eur_rate / usd_rate,
                    source: DERIVED_SOURCE_NAME.to_string(),
                });
            }
        }

        rates
    }
}

#[async_trait]
impl RateProvider for CbrProvider {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn daily_rates(&self, date: NaiveDate) -> Result<Vec<NewCurrencyRate>> {
        // The bulletin published on day N holds the official rate for day
        // N-1, so probing starts one day ahead and walks forward over
        // weekends and holidays.
        let mut request_date = date + Duration::days(1);

        for _ in 0..MAX_BULLETIN_PROBES {
            let url = format!("{}?date_req={}", self.base_url, format_cbr_date(request_date));
            let response = self.client.get(&url).send().await?;

            if response.status().is_success() {
                let body = response.text().await?;
                let bulletin = parse_bulletin(&body)?;
                debug!(
                    "CBR bulletin {} used for store date {}",
                    bulletin.date, date
                );
                return Ok(self.rates_for_date(date, &bulletin));
            }

            request_date += Duration::days(1);
        }

        Err(FxError::FetchFailed(format!(
            "No CBR bulletin found near {}",
            date
        )))
    }
}

fn format_cbr_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn parse_bulletin(xml: &str) -> Result<CbrBulletin> {
    let date_captures = BULLETIN_DATE_RE
        .captures(xml)
        .ok_or_else(|| FxError::ParseFailed("CBR response missing date attribute".to_string()))?;

    let parse_part = |idx: usize| -> Result<u32> {
        date_captures[idx]
            .parse::<u32>()
            .map_err(|e| FxError::ParseFailed(e.to_string()))
    };
    let (day, month) = (parse_part(1)?, parse_part(2)?);
    let year = date_captures[3]
        .parse::<i32>()
        .map_err(|e| FxError::ParseFailed(e.to_string()))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| FxError::ParseFailed(format!("Invalid CBR date {}-{}-{}", year, month, day)))?;

    let mut quotes = HashMap::new();
    for valute in VALUTE_RE.captures_iter(xml) {
        let block = &valute[1];
        let (Some(code), Some(nominal), Some(value)) = (
            CHAR_CODE_RE.captures(block),
            NOMINAL_RE.captures(block),
            VALUE_RE.captures(block),
        ) else {
            continue;
        };

        let nominal = match Decimal::from_str(&nominal[1]) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let value = match Decimal::from_str(&value[1].replace(',', ".")) {
            Ok(v) => v,
            Err(_) => continue,
        };

        quotes.insert(code[1].to_string(), CbrQuote { nominal, value });
    }

    Ok(CbrBulletin { date, quotes })
}
