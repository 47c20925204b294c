//! Pulls medication names, procedure names, vital-sign readings and the
//! diagnosis, treatment and follow-up statements out of a normalized
//! document. Works on expanded text, so `BP 120/80` is seen as
//! `Blood Pressure 120/80` and `81 mg` as `81 milligrams`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dictionary::Category;
use crate::normalize::NormalizedDocument;
use crate::text::capitalize_first;

static DOSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z][a-z-]+)\s+\d+(?:\.\d+)?\s*(?:mg|mcg|milligrams|micrograms)\b")
        .expect("valid dose regex")
});

static DOSAGE_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z][a-z-]+)\s+(?:tablet|capsule)s?\b").expect("valid dosage form regex")
});

static VITALS: LazyLock<Vec<(VitalSign, Regex)>> = LazyLock::new(|| {
    [
        (VitalSign::BloodPressure, r"(?i)\bblood pressure:?\s*(\d{2,3}/\d{2,3})\b"),
        (VitalSign::HeartRate, r"(?i)\bheart rate:?\s*(\d{2,3})\b"),
        (VitalSign::RespiratoryRate, r"(?i)\brespiratory rate:?\s*(\d{1,2})\b"),
        (VitalSign::Temperature, r"(?i)\btemperature:?\s*(\d{2,3}(?:\.\d+)?)"),
    ]
    .into_iter()
    .map(|(vital, pattern)| (vital, Regex::new(pattern).expect("valid vital regex")))
    .collect()
});

static DIAGNOSIS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    statement_patterns(&[
        r"(?i)\b(?:diagnosis|impression|assessment)\s*:\s*([^.!?]+)",
        r"(?i)\bdiagnosed with\s+([^.!?]+)",
        r"(?i)\bdiagnosis of\s+([^.!?]+)",
    ])
});

static TREATMENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    statement_patterns(&[
        r"(?i)\btreatment\s*:\s*([^.!?]+)",
        r"(?i)\btreated with\s+([^.!?]+)",
        r"(?i)\bplan\s*:\s*([^.!?]+)",
    ])
});

static FOLLOW_UP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    statement_patterns(&[
        r"(?i)\bfollow[-\s]?up\s*:?\s*([^.!?]+)",
        r"(?i)\brecommendations?\s*:\s*([^.!?]+)",
        r"(?i)\bdischarge instructions\s*:?\s*([^.!?]+)",
    ])
});

fn statement_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid statement regex"))
        .collect()
}

/// First capture of the first pattern that matches, trimmed of dangling
/// clause punctuation.
fn first_statement(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|regex| {
        let caps = regex.captures(text)?;
        let statement = caps[1].trim().trim_end_matches([',', ';', ':']).trim_end();
        (!statement.is_empty()).then(|| statement.to_string())
    })
}

const PROCEDURES: &[&str] = &[
    "catheterization",
    "angioplasty",
    "surgery",
    "biopsy",
    "endoscopy",
    "bronchoscopy",
    "colonoscopy",
    "echocardiogram",
    "CT scan",
    "MRI",
    "X-ray",
    "ultrasound",
    "blood transfusion",
    "dialysis",
];

/// Words that precede a dose without being a drug name (`take 2 tablets`).
const NOT_MEDICATIONS: &[&str] = &[
    "take", "takes", "taking", "of", "and", "with", "the", "a", "then", "daily", "was", "is",
    "given", "dose", "to", "on", "by", "increased", "decreased",
];

static PROCEDURE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    PROCEDURES
        .iter()
        .map(|name| {
            let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)))
                .expect("valid procedure regex");
            (*name, regex)
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    BloodPressure,
    HeartRate,
    RespiratoryRate,
    Temperature,
}

impl VitalSign {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BloodPressure => "blood pressure",
            Self::HeartRate => "heart rate",
            Self::RespiratoryRate => "respiratory rate",
            Self::Temperature => "temperature",
        }
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFindings {
    pub medications: BTreeSet<String>,
    pub procedures: BTreeSet<String>,
    pub vital_signs: BTreeMap<VitalSign, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    /// Stated treatment or plan; falls back to the procedures found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

impl KeyFindings {
    pub fn extract(document: &NormalizedDocument) -> Self {
        let text = document.text();
        let mut findings = Self::default();

        for regex in [&*DOSED, &*DOSAGE_FORM] {
            for caps in regex.captures_iter(&text) {
                let name = caps[1].to_lowercase();
                if !NOT_MEDICATIONS.contains(&name.as_str()) {
                    findings.medications.insert(capitalize_first(&name));
                }
            }
        }

        for (name, regex) in PROCEDURE_PATTERNS.iter() {
            if regex.is_match(&text) {
                findings.procedures.insert((*name).to_string());
            }
        }

        for (vital, regex) in VITALS.iter() {
            if let Some(caps) = regex.captures(&text) {
                findings.vital_signs.insert(*vital, caps[1].to_string());
            }
        }

        findings.diagnosis = first_statement(&DIAGNOSIS, &text);
        findings.treatment = first_statement(&TREATMENT, &text).or_else(|| {
            (!findings.procedures.is_empty()).then(|| {
                let first_two: Vec<&str> =
                    findings.procedures.iter().take(2).map(String::as_str).collect();
                first_two.join(", ")
            })
        });
        findings.follow_up = first_statement(&FOLLOW_UP, &text);

        findings
    }

    /// Drops the groups whose category the caller did not ask for.
    pub fn retain_categories(&mut self, include: &BTreeSet<Category>) {
        if !include.contains(&Category::Medication) {
            self.medications.clear();
        }
        if !include.contains(&Category::Procedure) {
            self.procedures.clear();
        }
        if !include.contains(&Category::Vital) {
            self.vital_signs.clear();
        }
        if !include.contains(&Category::Diagnosis) {
            self.diagnosis = None;
        }
        if !include.contains(&Category::Recommendation) {
            self.treatment = None;
            self.follow_up = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
            && self.procedures.is_empty()
            && self.vital_signs.is_empty()
            && self.diagnosis.is_none()
            && self.treatment.is_none()
            && self.follow_up.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::normalize::TextNormalizer;

    fn findings(raw: &str) -> KeyFindings {
        let doc = TextNormalizer::new(Dictionary::builtin())
            .normalize(raw)
            .unwrap();
        KeyFindings::extract(&doc)
    }

    #[test]
    fn finds_medications() {
        let f = findings(
            "Started aspirin 81 mg daily and metoprolol 25mg BID. Take 2 tablets of \
             acetaminophen. Continue lisinopril tablet.",
        );
        let meds: Vec<_> = f.medications.iter().map(String::as_str).collect();
        assert_eq!(meds, vec!["Aspirin", "Lisinopril", "Metoprolol"]);
    }

    #[test]
    fn finds_procedures_once() {
        let f = findings("CT scan negative. Repeat ct scan tomorrow, then biopsy.");
        let procs: Vec<_> = f.procedures.iter().map(String::as_str).collect();
        assert_eq!(procs, vec!["CT scan", "biopsy"]);
    }

    #[test]
    fn finds_vitals_from_abbreviations() {
        let f = findings("BP 142/91, HR 104, RR 22, Temp 101.3. Repeat BP 130/85.");
        assert_eq!(f.vital_signs[&VitalSign::BloodPressure], "142/91");
        assert_eq!(f.vital_signs[&VitalSign::HeartRate], "104");
        assert_eq!(f.vital_signs[&VitalSign::RespiratoryRate], "22");
        assert_eq!(f.vital_signs[&VitalSign::Temperature], "101.3");
    }

    #[test]
    fn retain_categories_clears_excluded_groups() {
        let mut f = findings("Aspirin 81 mg daily. BP 120/80. Echocardiogram normal.");
        assert!(!f.is_empty());

        let include: BTreeSet<_> = [Category::Vital].into_iter().collect();
        f.retain_categories(&include);
        assert!(f.medications.is_empty());
        assert!(f.procedures.is_empty());
        assert_eq!(f.vital_signs.len(), 1);
    }

    #[test]
    fn finds_diagnosis_treatment_and_follow_up() {
        let f = findings(
            "Dx: community-acquired pneumonia. Treated with azithromycin for 5 days. \
             F/U with PCP in 1 week; return if fever recurs.",
        );
        assert_eq!(f.diagnosis.as_deref(), Some("community-acquired pneumonia"));
        assert_eq!(f.treatment.as_deref(), Some("azithromycin for 5 days"));
        assert_eq!(
            f.follow_up.as_deref(),
            Some("with PCP in 1 week; return if fever recurs")
        );
    }

    #[test]
    fn treatment_falls_back_to_procedures() {
        let f = findings(
            "Diagnosed with gallstones. Surgery and ultrasound scheduled. Biopsy pending.",
        );
        assert_eq!(f.diagnosis.as_deref(), Some("gallstones"));
        assert_eq!(f.treatment.as_deref(), Some("biopsy, surgery"));
        assert_eq!(f.follow_up, None);
    }

    #[test]
    fn retain_categories_clears_statements() {
        let mut f = findings("Impression: angina. Plan: stress test. Follow-up: cardiology.");
        assert!(f.diagnosis.is_some() && f.treatment.is_some() && f.follow_up.is_some());

        let include: BTreeSet<_> = [Category::Diagnosis].into_iter().collect();
        f.retain_categories(&include);
        assert_eq!(f.diagnosis.as_deref(), Some("angina"));
        assert_eq!(f.treatment, None);
        assert_eq!(f.follow_up, None);
    }

    #[test]
    fn nothing_found_in_plain_text() {
        assert!(findings("The weather was pleasant.").is_empty());
    }
}
