use std::collections::{HashMap, HashSet};

const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "Washington DC"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("AS", "American Samoa"),
    ("GU", "Guam"),
    ("MP", "Northern Mariana Islands"),
    ("PR", "Puerto Rico"),
    ("VI", "Virgin Islands"),
];

/// Minor words kept lower-case unless they open the phrase.
const MINOR_WORDS: &[&str] = &["and", "da", "de", "del", "di", "du", "of", "the", "y", "e"];

/// Abbreviations kept upper-case wherever they appear.
const ABBREVIATIONS: &[&str] = &["USA", "DC", "UK", "UAE", "DRC"];

const LAB_SPELLING_FIXES: &[(&str, &str)] = &[
    ("Contorl", "Control"),
    ("Dieases", "Disease"),
    ("Insitute", "Institute"),
    ("Laboratoty", "Laboratory"),
    ("Hosptial", "Hospital"),
    ("Respiratroy", "Respiratory"),
];

/// Immutable lookup tables shared by the normalizers.
///
/// Built once per run and handed to each stage by reference.
#[derive(Debug, Clone)]
pub struct Lookups {
    us_state_codes: HashMap<String, String>,
    us_state_names: HashSet<String>,
    minor_words: HashSet<String>,
    abbreviations: HashSet<String>,
    lab_spelling_fixes: Vec<(String, String)>,
}

impl Lookups {
    pub fn builtin() -> Self {
        let us_state_codes = US_STATES
            .iter()
            .map(|(code, name)| (code.to_string(), name.to_string()))
            .collect();
        let us_state_names = US_STATES
            .iter()
            .map(|(_, name)| name.to_lowercase())
            .collect();
        Self {
            us_state_codes,
            us_state_names,
            minor_words: MINOR_WORDS.iter().map(|w| w.to_string()).collect(),
            abbreviations: ABBREVIATIONS.iter().map(|w| w.to_string()).collect(),
            lab_spelling_fixes: LAB_SPELLING_FIXES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Full state name for a two-letter code, case-insensitively.
    pub fn us_state_name(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        if code.len() != 2 {
            return None;
        }
        self.us_state_codes
            .get(&code.to_uppercase())
            .map(String::as_str)
    }

    pub fn is_us_state(&self, value: &str) -> bool {
        self.us_state_name(value).is_some()
            || self.us_state_names.contains(&value.trim().to_lowercase())
    }

    pub fn is_minor_word(&self, word: &str) -> bool {
        self.minor_words.contains(&word.to_lowercase())
    }

    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviations.contains(&word.to_uppercase())
    }

    pub fn lab_spelling_fixes(&self) -> &[(String, String)] {
        &self.lab_spelling_fixes
    }
}
