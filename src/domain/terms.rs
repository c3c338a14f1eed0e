//! Configured sensitive-information labels.
//!
//! [`TermList`] is the editable, persisted list of labels owned by the user.
//! [`TermSet`] is the immutable snapshot a redaction run works from, split by
//! the matching strategy each label needs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Built-in labels used when no term file is configured.
pub const DEFAULT_TERMS: &[&str] = &[
    // English
    "Name", "Last Name", "Family Name", "First Name", "Middle Name", "Address",
    "Street Address", "City", "State", "Zip", "County", "Date of Birth", "birthdate",
    "DOB", "Age", "Date of Admission", "Admission Date", "Date of Discharge",
    "Discharge Date", "Date of Death", "Date Measured", "Telephone Number", "Phone",
    "Fax Number", "Fax", "Email Address", "Email", "Social Security Number", "SSN",
    "Medical Record Number", "MRN", "Patient ID", "Patient Number",
    "Health Plan Beneficiary Number", "Member ID", "Insurance ID", "Insurance Number",
    "Health Insurance", "Account Number", "Certificate/License Number",
    "Vehicle Identifier", "License Plate", "Device Identifier", "Serial Number", "Sex",
    "Gender", "Attending Physician", "Referring Physician",
    // German
    "Nachname", "Vorname", "Adresse", "Straße", "Stadt", "Ort", "Land", "PLZ",
    "Postleitzahl", "Geburtsdatum", "Geburtstag", "Geb.", "Alter", "Aufnahmedatum",
    "Entlassungsdatum", "Todesdatum", "Messdatum", "Telefonnummer", "Tel", "Faxnummer",
    "E-Mail", "Sozialversicherungsnummer", "SV-Nummer", "Patienten-ID", "Patientennummer",
    "Krankenversicherungsnummer", "Versichertennummer", "Kontonummer", "Lizenznummer",
    "Fahrzeug-ID", "Kennzeichen", "Geräte-ID", "Seriennummer", "Geschlecht",
    "Behandelnder Arzt", "Überweisender Arzt", "Arzt", "Klinik", "Krankenhaus",
    // French
    "Nom", "Nom de naissance", "Nom de famille", "Prénom", "Rue", "Ville", "Code Postal",
    "Date de naissance", "Né(e) le", "Âge", "Date d'admission", "Date d'entrée",
    "Date de sortie", "Date de décès", "Date de la mesure", "Numéro de téléphone", "Tél",
    "Numéro de fax", "Adresse e-mail", "Courriel", "Numéro de Sécurité Sociale", "N° SS",
    "Numéro de dossier patient", "N° Dossier", "ID Patient", "Numéro d'assurance maladie",
    "Numéro de compte", "Numéro de licence", "Plaque d'immatriculation", "Numéro de série",
    "Identifiant de l'appareil", "Sexe", "Genre", "Médecin traitant", "Médecin référent",
];

fn whitespace_run() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Valid regex pattern"));
    &PATTERN
}

/// Errors raised while reading or writing a term file.
#[derive(Debug, Error)]
pub enum TermFileError {
    #[error("failed to read term file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("term file '{}' is not a JSON array of strings: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write term file '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize terms: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("term is empty after trimming")]
    EmptyTerm,

    #[error("term '{0}' is already in the list")]
    Duplicate(String),
}

/// Ordered, user-editable list of labels.
///
/// Uniqueness is enforced here, case-insensitively, when terms are added.
/// Lists loaded from disk are taken as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermList {
    terms: Vec<String>,
}

impl TermList {
    pub fn new(terms: Vec<String>) -> Self {
        Self { terms }
    }

    /// The built-in multilingual list.
    pub fn defaults() -> Self {
        Self::new(DEFAULT_TERMS.iter().map(|t| t.to_string()).collect())
    }

    /// Reads a JSON array of strings.
    pub fn load(path: &Path) -> Result<Self, TermFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| TermFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let terms: Vec<String> =
            serde_json::from_str(&content).map_err(|source| TermFileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(count = terms.len(), path = %path.display(), "Loaded term file");
        Ok(Self::new(terms))
    }

    /// Loads `path`, falling back to [`TermList::defaults`].
    ///
    /// A missing file is the normal first-run case and falls back quietly.
    /// An unreadable or malformed file also falls back, with a warning, so a
    /// damaged list never leaves the user without any redaction labels.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No term file, using built-in terms");
            return Self::defaults();
        }
        match Self::load(path) {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "Falling back to built-in terms");
                Self::defaults()
            }
        }
    }

    /// Writes the list as pretty-printed JSON, keeping non-ASCII verbatim.
    pub fn save(&self, path: &Path) -> Result<(), TermFileError> {
        let content = serde_json::to_string_pretty(&self.terms)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TermFileError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| TermFileError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Appends `term` unless an equal term (ignoring case) is present.
    ///
    /// Returns `Ok(false)` for a duplicate.
    pub fn add(&mut self, term: &str) -> Result<bool, TermFileError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(TermFileError::EmptyTerm);
        }
        let folded = term.to_lowercase();
        if self.terms.iter().any(|t| t.trim().to_lowercase() == folded) {
            return Ok(false);
        }
        self.terms.push(term.to_string());
        Ok(true)
    }

    /// Removes every term equal to `term` ignoring case. Returns whether any
    /// was removed.
    pub fn remove(&mut self, term: &str) -> bool {
        let folded = term.trim().to_lowercase();
        let before = self.terms.len();
        self.terms.retain(|t| t.trim().to_lowercase() != folded);
        self.terms.len() != before
    }

    /// Replaces the term equal to `old` (ignoring case) with `new`, keeping
    /// its position.
    ///
    /// Returns `Ok(false)` if `old` is not in the list.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<bool, TermFileError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(TermFileError::EmptyTerm);
        }
        let old_folded = old.trim().to_lowercase();
        let Some(index) = self
            .terms
            .iter()
            .position(|t| t.trim().to_lowercase() == old_folded)
        else {
            return Ok(false);
        };

        let new_folded = new.to_lowercase();
        let taken = self
            .terms
            .iter()
            .enumerate()
            .any(|(i, t)| i != index && t.trim().to_lowercase() == new_folded);
        if taken {
            return Err(TermFileError::Duplicate(new.to_string()));
        }
        self.terms[index] = new.to_string();
        Ok(true)
    }

    /// Terms containing `query`, ignoring case, in list order.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.terms
            .iter()
            .filter(|t| t.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Captures the immutable snapshot used by a run.
    pub fn snapshot(&self) -> TermSet {
        TermSet::new(&self.terms)
    }
}

impl Default for TermList {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Immutable partition of labels into single-word and phrase forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    single_terms: Vec<String>,
    phrase_terms: Vec<String>,
    single_terms_lower: HashSet<String>,
}

impl TermSet {
    /// Partitions `terms`.
    ///
    /// Terms are trimmed and empty ones dropped. A term containing whitespace
    /// becomes a phrase term with whitespace runs collapsed to one space;
    /// phrase terms equal ignoring case are kept once, in first-seen order.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        let mut seen_phrases = HashSet::new();

        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            if term.chars().any(char::is_whitespace) {
                let phrase = whitespace_run().replace_all(term, " ").into_owned();
                if seen_phrases.insert(phrase.to_lowercase()) {
                    set.phrase_terms.push(phrase);
                }
            } else {
                set.single_terms_lower.insert(term.to_lowercase());
                set.single_terms.push(term.to_string());
            }
        }

        set
    }

    /// Snapshot of the built-in list.
    pub fn defaults() -> Self {
        Self::new(DEFAULT_TERMS)
    }

    pub fn single_terms(&self) -> &[String] {
        &self.single_terms
    }

    pub fn phrase_terms(&self) -> &[String] {
        &self.phrase_terms
    }

    pub fn single_terms_lower(&self) -> &HashSet<String> {
        &self.single_terms_lower
    }

    /// Membership test against the case-folded single terms.
    pub fn contains_single(&self, folded: &str) -> bool {
        self.single_terms_lower.contains(folded)
    }

    pub fn is_empty(&self) -> bool {
        self.single_terms.is_empty() && self.phrase_terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.single_terms.len() + self.phrase_terms.len()
    }
}
