use crate::domain::{Provider, Record};
use crate::error::IngestError;
use crate::lookups::Lookups;

/// Layout of a provider's single free-text location field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationGrammar {
    /// `country`, `country: division` or `country: division, location`.
    ColonComma,
    /// Up to four `/`-delimited levels, `region/country/division/location`.
    Slash,
}

impl LocationGrammar {
    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::Gisaid => LocationGrammar::Slash,
            Provider::Genbank => LocationGrammar::ColonComma,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLevels {
    pub region: String,
    pub country: String,
    pub division: String,
    pub location: String,
}

pub struct GeoParser<'a> {
    grammar: LocationGrammar,
    lookups: &'a Lookups,
}

impl<'a> GeoParser<'a> {
    pub fn new(grammar: LocationGrammar, lookups: &'a Lookups) -> Self {
        Self { grammar, lookups }
    }

    /// Splits `raw` into hierarchy levels. `None` means the text fits no
    /// known layout.
    pub fn parse(&self, raw: &str) -> Option<GeoLevels> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(GeoLevels::default());
        }
        let levels = match self.grammar {
            LocationGrammar::ColonComma => self.parse_colon_comma(raw)?,
            LocationGrammar::Slash => parse_slash(raw)?,
        };
        Some(GeoLevels {
            region: titlecase(&levels.region, self.lookups),
            country: titlecase(&levels.country, self.lookups),
            division: titlecase(&levels.division, self.lookups),
            location: titlecase(&levels.location, self.lookups),
        })
    }

    /// Replaces the raw location text held in `record.location` with the
    /// parsed hierarchy.
    pub fn apply(&self, record: &mut Record, provider: Provider) -> Result<(), IngestError> {
        let raw = std::mem::take(&mut record.location);
        let levels = self
            .parse(&raw)
            .ok_or_else(|| IngestError::UnparseableLocation {
                record: record.describe(provider),
                location: raw.clone(),
            })?;
        record.region = levels.region;
        record.country = levels.country;
        record.division = levels.division;
        record.location = levels.location;
        Ok(())
    }

    fn parse_colon_comma(&self, raw: &str) -> Option<GeoLevels> {
        let (country, rest) = match raw.split_once(':') {
            Some((country, rest)) => (country.trim(), rest),
            None => (raw, ""),
        };
        if country.is_empty() || country.contains('/') || country.contains(',') {
            return None;
        }
        if rest.contains(':') {
            return None;
        }
        let (mut division, mut location) = match rest.split_once(',') {
            Some((division, location)) => (division.trim(), location.trim()),
            None => (rest.trim(), ""),
        };

        let mut division_name = None;
        if country.eq_ignore_ascii_case("usa") {
            if !location.is_empty()
                && self.lookups.is_us_state(location)
                && !self.lookups.is_us_state(division)
            {
                std::mem::swap(&mut division, &mut location);
            }
            division_name = self.lookups.us_state_name(division);
        }

        Some(GeoLevels {
            region: String::new(),
            country: country.to_string(),
            division: division_name.unwrap_or(division).to_string(),
            location: location.to_string(),
        })
    }
}

fn parse_slash(raw: &str) -> Option<GeoLevels> {
    let tokens = raw.split('/').map(str::trim).collect::<Vec<_>>();
    if tokens.len() > 4 {
        return None;
    }
    let level = |idx: usize| tokens.get(idx).map(|t| t.to_string()).unwrap_or_default();
    Some(GeoLevels {
        region: level(0),
        country: level(1),
        division: level(2),
        location: level(3),
    })
}

/// Title-cases place names word by word.
///
/// Abbreviations stay upper-case everywhere, minor words stay lower-case
/// except in first position. Applying it twice gives the same result.
pub fn titlecase(text: &str, lookups: &Lookups) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(idx, word)| {
            if lookups.is_abbreviation(word) {
                word.to_uppercase()
            } else if idx > 0 && lookups.is_minor_word(word) {
                word.to_lowercase()
            } else {
                capitalize_segments(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_segments(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut at_segment_start = true;
    for ch in lower.chars() {
        if at_segment_start && ch.is_alphabetic() {
            let mut upper = ch.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(single), None) => out.push(single),
                _ => out.push(ch),
            }
            at_segment_start = false;
        } else {
            out.push(ch);
            if ch == '-' {
                at_segment_start = true;
            } else if ch.is_alphanumeric() {
                at_segment_start = false;
            }
        }
    }
    out
}
