use regex::{Regex, RegexBuilder};

use crate::error::IngestError;

/// Ordered `(pattern, replacement)` pairs. Later rules assume the earlier
/// prefixes are already gone, so the order must not change.
const STRAIN_RULES: &[(&str, &str)] = &[
    (r"^SARS-CoV-2/", ""),
    (r"^2019-nCoV/", ""),
    (r"^BetaCoV/", ""),
    (r"^nCoV-", ""),
    (r"^hCoV-19/", ""),
    (r"^human/", ""),
    (r"^homo sapiens?/", ""),
    (r"^USA-", "USA/"),
    (r"^USACT-", "USA/CT-"),
    (r"^USAWA-", "USA/WA-"),
    (r"^HKG\.", "HongKong/"),
];

/// Three slash-delimited tokens followed by whitespace, a comma or the end
/// of the title.
const TITLE_STRAIN_PATTERN: &str = r"([^\s/,]+/[^\s/,]+/[^\s/,]+)(?:[\s,]|$)";

#[derive(Debug, Clone)]
pub struct StrainNormalizer {
    rules: Vec<(Regex, &'static str)>,
    title_strain: Regex,
    whitespace: Regex,
}

impl StrainNormalizer {
    pub fn new() -> Result<Self, IngestError> {
        let rules = STRAIN_RULES
            .iter()
            .map(|(pattern, replacement)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| (regex, *replacement))
                    .map_err(|err| IngestError::InvalidPattern(err.to_string()))
            })
            .collect::<Result<Vec<_>, IngestError>>()?;
        let title_strain = Regex::new(TITLE_STRAIN_PATTERN)
            .map_err(|err| IngestError::InvalidPattern(err.to_string()))?;
        let whitespace =
            Regex::new(r"\s+").map_err(|err| IngestError::InvalidPattern(err.to_string()))?;
        Ok(Self {
            rules,
            title_strain,
            whitespace,
        })
    }

    /// Canonical strain for a raw virus name, falling back to a name found in
    /// `title` when the raw name is blank. Returns an empty string when
    /// neither yields anything.
    pub fn normalize(&self, raw: &str, title: &str) -> String {
        let mut strain = raw.trim().to_string();
        if strain.is_empty() {
            strain = self.strain_from_title(title).unwrap_or_default();
        }
        for (pattern, replacement) in &self.rules {
            strain = pattern.replace(&strain, *replacement).into_owned();
        }
        self.whitespace.replace_all(&strain, "").into_owned()
    }

    pub fn strain_from_title(&self, title: &str) -> Option<String> {
        self.title_strain
            .captures(title)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }
}
