use std::cmp::Ordering;

use crate::domain::{Provider, Record, SENTINEL};

/// Total order used to pick one record per strain: strain, longest
/// sequence first, earliest submission first (unknown dates last), then
/// accession.
pub fn preference_order(a: &Record, b: &Record, provider: Provider) -> Ordering {
    a.strain
        .cmp(&b.strain)
        .then_with(|| b.length.cmp(&a.length))
        .then_with(|| compare_submission(&a.date_submitted, &b.date_submitted))
        .then_with(|| a.accession(provider).cmp(b.accession(provider)))
}

fn compare_submission(a: &str, b: &str) -> Ordering {
    let known = |value: &str| !value.is_empty() && value != SENTINEL;
    match (known(a), known(b)) {
        (true, true) => a.cmp(b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Keeps the preferred record for every strain and returns the survivors in
/// preference order together with the number dropped. Records without a
/// strain are never merged with one another.
pub fn deduplicate(mut records: Vec<Record>, provider: Provider) -> (Vec<Record>, usize) {
    let before = records.len();
    records.sort_by(|a, b| preference_order(a, b, provider));
    records.dedup_by(|later, earlier| !later.strain.is_empty() && later.strain == earlier.strain);
    let dropped = before - records.len();
    (records, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(accession: &str, strain: &str, length: u64, submitted: &str) -> Record {
        Record {
            genbank_accession: accession.to_string(),
            strain: strain.to_string(),
            length,
            date_submitted: submitted.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn longest_sequence_wins_regardless_of_date() {
        let records = vec![
            record("MT000001", "USA/CA1/2020", 29800, "2020-03-01"),
            record("MT000002", "USA/CA1/2020", 29900, "2020-05-01"),
        ];
        let (kept, dropped) = deduplicate(records, Provider::Genbank);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].genbank_accession, "MT000002");
    }

    #[test]
    fn equal_length_prefers_earliest_submission() {
        let records = vec![
            record("MT000003", "USA/CA2/2020", 29900, "?"),
            record("MT000002", "USA/CA2/2020", 29900, "2020-05-01"),
            record("MT000001", "USA/CA2/2020", 29900, "2020-04-01"),
        ];
        let (kept, _) = deduplicate(records, Provider::Genbank);
        assert_eq!(kept[0].genbank_accession, "MT000001");
    }

    #[test]
    fn order_independent_of_input_order() {
        let records = vec![
            record("B", "Italy/1/2020", 29903, "2020-03-01"),
            record("A", "Italy/1/2020", 29903, "2020-03-01"),
            record("C", "Chile/7/2020", 29000, ""),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        let (forward, _) = deduplicate(records, Provider::Genbank);
        let (backward, _) = deduplicate(reversed, Provider::Genbank);
        assert_eq!(forward, backward);
        assert_eq!(forward[1].genbank_accession, "A");
    }

    #[test]
    fn blank_strains_are_not_merged() {
        let records = vec![record("X1", "", 29903, ""), record("X2", "", 29903, "")];
        let (kept, dropped) = deduplicate(records, Provider::Genbank);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 0);
    }
}
