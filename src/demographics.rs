use regex::Regex;

use crate::domain::SENTINEL;
use crate::error::IngestError;
use crate::lookups::Lookups;

/// Ages above this are treated as entry errors.
const MAX_AGE_YEARS: f64 = 150.0;

/// Normalizers for author, lab, age and sex free text.
#[derive(Debug, Clone)]
pub struct DemographicNormalizer {
    whitespace: Regex,
    author_separator: Regex,
    decade: Regex,
    age_with_unit: Regex,
    lab_fixes: Vec<(Regex, String)>,
}

impl DemographicNormalizer {
    pub fn new(lookups: &Lookups) -> Result<Self, IngestError> {
        let lab_fixes = lookups
            .lab_spelling_fixes()
            .iter()
            .map(|(from, to)| {
                Regex::new(&format!(r"\b{}\b", regex::escape(from)))
                    .map(|regex| (regex, to.clone()))
                    .map_err(|err| IngestError::InvalidPattern(err.to_string()))
            })
            .collect::<Result<Vec<_>, IngestError>>()?;
        Ok(Self {
            whitespace: compile(r"\s+")?,
            author_separator: compile(r"(?i)[,;，；]| and | & | ＆ ")?,
            decade: compile(r"^\d+'?s$")?,
            age_with_unit: compile(r"(?i)^(\d+(?:\.\d+)?)\s*(years?|yrs?|y|months?|mos?|m)?$")?,
            lab_fixes,
        })
    }

    /// First author followed by `et al`, or the sentinel when there is none.
    pub fn authors(&self, raw: &str) -> String {
        let collapsed = self.collapse_whitespace(raw);
        let first = match self.author_separator.find(&collapsed) {
            Some(separator) => collapsed[..separator.start()].trim(),
            None => collapsed.as_str(),
        };
        if first.is_empty() || first == SENTINEL {
            return SENTINEL.to_string();
        }
        format!("{first} et al")
    }

    pub fn lab(&self, raw: &str) -> String {
        let mut lab = self.collapse_whitespace(raw);
        if lab.is_empty() {
            return SENTINEL.to_string();
        }
        for (pattern, replacement) in &self.lab_fixes {
            lab = pattern.replace_all(&lab, replacement.as_str()).into_owned();
        }
        lab
    }

    /// Age in years. Decades, zero, implausibly large values and anything
    /// non-numeric become the sentinel; month counts become fractional years.
    pub fn age(&self, raw: &str) -> String {
        let age = raw.trim();
        if age.is_empty() || self.decade.is_match(age) {
            return SENTINEL.to_string();
        }
        let Some(captures) = self.age_with_unit.captures(age) else {
            return SENTINEL.to_string();
        };
        let Ok(value) = captures[1].parse::<f64>() else {
            return SENTINEL.to_string();
        };
        let in_months = captures
            .get(2)
            .map(|unit| unit.as_str().to_lowercase().starts_with('m'))
            .unwrap_or(false);
        let years = if in_months { value / 12.0 } else { value };
        if years <= 0.0 || years > MAX_AGE_YEARS || !years.is_finite() {
            return SENTINEL.to_string();
        }
        format_number(years)
    }

    pub fn sex(&self, raw: &str) -> String {
        let sex = raw.trim();
        match sex.to_lowercase().as_str() {
            "male" | "m" | "man" => "Male".to_string(),
            "female" | "f" | "woman" => "Female".to_string(),
            "" | "?" | "unknown" | "n/a" | "na" | "not applicable" | "not provided"
            | "missing" => SENTINEL.to_string(),
            _ => sex.to_string(),
        }
    }

    fn collapse_whitespace(&self, raw: &str) -> String {
        self.whitespace.replace_all(raw.trim(), " ").into_owned()
    }
}

fn compile(pattern: &str) -> Result<Regex, IngestError> {
    Regex::new(pattern).map_err(|err| IngestError::InvalidPattern(err.to_string()))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> DemographicNormalizer {
        DemographicNormalizer::new(&Lookups::builtin()).unwrap()
    }

    #[test]
    fn authors_keep_first_token() {
        let n = normalizer();
        assert_eq!(n.authors("Smith,  J., Doe, K."), "Smith et al");
        assert_eq!(n.authors("Wang  Li;Zhang Wei"), "Wang Li et al");
        assert_eq!(n.authors("Ana Costa and Rui Pires"), "Ana Costa et al");
        assert_eq!(n.authors("Kim & Lee"), "Kim et al");
        assert_eq!(n.authors("Costa AND Pires"), "Costa et al");
        assert_eq!(n.authors("Costa And Pires"), "Costa et al");
        assert_eq!(n.authors("李明，王芳"), "李明 et al");
        assert_eq!(n.authors("Alone"), "Alone et al");
        assert_eq!(n.authors("   "), "?");
        assert_eq!(n.authors(", Doe"), "?");
    }

    #[test]
    fn lab_spelling_and_whitespace() {
        let n = normalizer();
        assert_eq!(
            n.lab("Centers for  Dieases Contorl\tand Prevention"),
            "Centers for Disease Control and Prevention"
        );
        assert_eq!(n.lab(""), "?");
    }

    #[test]
    fn age_variants() {
        let n = normalizer();
        assert_eq!(n.age("60s"), "?");
        assert_eq!(n.age("50's"), "?");
        assert_eq!(n.age("45 years"), "45");
        assert_eq!(n.age("45"), "45");
        assert_eq!(n.age("45.0"), "45");
        assert_eq!(n.age("6 months"), "0.5");
        assert_eq!(n.age("24 months"), "2");
        assert_eq!(n.age("0"), "?");
        assert_eq!(n.age("150"), "150");
        assert_eq!(n.age("151"), "?");
        assert_eq!(n.age("99999999999999999999"), "?");
        assert_eq!(n.age("unknown"), "?");
        assert_eq!(n.age("adult"), "?");
        assert_eq!(n.age(""), "?");
    }

    #[test]
    fn sex_variants() {
        let n = normalizer();
        assert_eq!(n.sex("M"), "Male");
        assert_eq!(n.sex("female"), "Female");
        assert_eq!(n.sex("FEMALE"), "Female");
        assert_eq!(n.sex("N/A"), "?");
        assert_eq!(n.sex("not applicable"), "?");
        assert_eq!(n.sex("Unknown"), "?");
        assert_eq!(n.sex(""), "?");
    }
}
