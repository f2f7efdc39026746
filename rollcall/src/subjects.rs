//! Canonical subject catalog.
//!
//! The catalog is a fixed, configuration-provided ordered list of subject
//! names. Matching is deliberately asymmetric: OTP issuance requires a
//! case-sensitive exact match, while attendance claims are matched
//! case-insensitively after trimming. Both behaviors are load-bearing and
//! preserved from the original deployment.

/// Normalize a subject the way attendance claims are compared: trimmed
/// and lowercased.
pub fn normalize_subject(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ordered list of recognized subject names.
#[derive(Debug, Clone)]
pub struct SubjectCatalog {
    subjects: Vec<String>,
}

impl SubjectCatalog {
    /// Create a catalog from an ordered list of canonical names.
    pub fn new(subjects: Vec<String>) -> Self {
        Self { subjects }
    }

    /// The catalog shipped with the original deployment.
    pub fn default_catalog() -> Self {
        Self::new(
            [
                "EMT",
                "VLSI",
                "DSA",
                "CE",
                "DSP",
                "Analog Electronics",
                "MICROPROCESSOR",
                "Communication Systems",
                "NETWORKS",
                "AI",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }

    /// Case-sensitive membership check, used for OTP issuance.
    pub fn contains_exact(&self, name: &str) -> bool {
        self.subjects.iter().any(|s| s == name)
    }

    /// Case-insensitive claim resolution: trims and lowercases `name` and
    /// returns the normalized form if it matches a catalog entry.
    pub fn resolve_claim(&self, name: &str) -> Option<String> {
        let normalized = normalize_subject(name);
        self.subjects
            .iter()
            .any(|s| s.to_lowercase() == normalized)
            .then_some(normalized)
    }

    /// Canonical names in catalog order.
    pub fn names(&self) -> &[String] {
        &self.subjects
    }
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
