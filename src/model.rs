//! Wire and listing types: documents, checks and the per-document checks bundle.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ── Documents ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Completed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Completed => "Completed",
        })
    }
}

/// One row of the document listing. A local, read-only snapshot; the
/// backend owns the real record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub status: DocumentStatus,
    pub last_updated: NaiveDate,
}

impl Document {
    /// Key the checks endpoint expects: the first word of the name.
    ///
    /// `"XYZ Document"` → `"XYZ"`.
    pub fn backend_key(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

fn listing_entry(id: &str, name: &str, status: DocumentStatus, (y, m, d): (i32, u32, u32)) -> Document {
    Document {
        id: id.to_string(),
        name: name.to_string(),
        status,
        last_updated: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
    }
}

static BUILTIN_DOCUMENTS: Lazy<Vec<Document>> = Lazy::new(|| {
    use DocumentStatus::*;
    vec![
        listing_entry("1", "XYZ Document", Completed, (2024, 3, 20)),
        listing_entry("2", "DEF Document", Pending, (2024, 3, 19)),
        listing_entry("3", "MNO Document", Completed, (2024, 3, 18)),
        listing_entry("4", "ABC Document", Pending, (2024, 3, 17)),
        listing_entry("5", "PQR Document", Completed, (2024, 3, 16)),
    ]
});

/// The documents the viewer can navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentCatalog {
    documents: Vec<Document>,
}

impl DocumentCatalog {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// The five-document listing shipped with the viewer.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_DOCUMENTS.clone())
    }

    pub fn find(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

// ── Checks ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// A single pass/fail assertion about the document, tied to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub text: String,
    pub status: CheckStatus,
    pub details: String,
    /// 1-indexed.
    pub page_number: u32,
}

impl Check {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// All checks of a document, grouped by category.
///
/// Categories keep the order in which the backend sent them; that order
/// is the tab order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChecksBundle {
    categories: Vec<(String, Vec<Check>)>,
}

impl ChecksBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category. A name that already exists keeps its tab
    /// position and takes the new list, so a repeated key in the backend's
    /// JSON resolves to its last value.
    pub fn push(&mut self, category: impl Into<String>, checks: Vec<Check>) {
        let category = category.into();
        match self.categories.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = checks,
            None => self.categories.push((category, checks)),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Category by tab index.
    pub fn category(&self, index: usize) -> Option<(&str, &[Check])> {
        self.categories
            .get(index)
            .map(|(name, checks)| (name.as_str(), checks.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&[Check]> {
        self.categories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, checks)| checks.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Check])> {
        self.categories
            .iter()
            .map(|(name, checks)| (name.as_str(), checks.as_slice()))
    }

    pub fn total_checks(&self) -> usize {
        self.categories.iter().map(|(_, c)| c.len()).sum()
    }

    pub fn failed_checks(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|(_, c)| c.iter())
            .filter(|c| !c.passed())
            .count()
    }
}

impl Serialize for ChecksBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (name, checks) in &self.categories {
            map.serialize_entry(name, checks)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChecksBundle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BundleVisitor;

        impl<'de> Visitor<'de> for BundleVisitor {
            type Value = ChecksBundle;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from category name to a list of checks")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut bundle = ChecksBundle::new();
                while let Some((name, checks)) = access.next_entry::<String, Vec<Check>>()? {
                    bundle.push(name, checks);
                }
                Ok(bundle)
            }
        }

        deserializer.deserialize_map(BundleVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_key_is_first_word() {
        let catalog = DocumentCatalog::builtin();
        assert_eq!(catalog.len(), 5);
        let doc = catalog.find("1").unwrap();
        assert_eq!(doc.backend_key(), "XYZ");
        assert_eq!(catalog.find("4").unwrap().backend_key(), "ABC");
        assert!(catalog.find("9").is_none());
    }

    #[test]
    fn document_serialises_camel_case() {
        let doc = DocumentCatalog::builtin().find("2").cloned().unwrap();
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["lastUpdated"], "2024-03-19");
        assert_eq!(v["status"], "pending");
        assert_eq!(doc.status.to_string(), "Pending");
    }

    #[test]
    fn bundle_keeps_category_order() {
        let json = r#"{
            "Section 2": [{"text":"b","status":"fail","details":"","page_number":3}],
            "Section 1": [{"text":"a","status":"pass","details":"","page_number":1}],
            "Appendix":  [{"text":"c","status":"pass","details":"","page_number":9}]
        }"#;
        let bundle: ChecksBundle = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = bundle.category_names().collect();
        assert_eq!(names, vec!["Section 2", "Section 1", "Appendix"]);
        assert_eq!(bundle.total_checks(), 3);
        assert_eq!(bundle.failed_checks(), 1);

        let out = serde_json::to_string(&bundle).unwrap();
        assert!(out.find("Section 2").unwrap() < out.find("Section 1").unwrap());
    }

    #[test]
    fn repeated_category_keeps_last_list() {
        let json = r#"{
            "Content":    [{"text":"old","status":"fail","details":"","page_number":1}],
            "Formatting": [{"text":"f","status":"pass","details":"","page_number":2}],
            "Content":    [{"text":"new","status":"pass","details":"","page_number":4}]
        }"#;
        let bundle: ChecksBundle = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = bundle.category_names().collect();
        assert_eq!(names, vec!["Content", "Formatting"]);
        let content = bundle.get("Content").unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].text, "new");
        assert_eq!(bundle.total_checks(), 2);
        assert_eq!(bundle.failed_checks(), 0);
    }

    #[test]
    fn check_wire_format() {
        let check: Check = serde_json::from_str(
            r#"{"text":"Header present","status":"pass","details":"ok","page_number":2}"#,
        )
        .unwrap();
        assert!(check.passed());
        assert_eq!(check.page_number, 2);
        assert!(serde_json::from_str::<Check>(
            r#"{"text":"x","status":"maybe","details":"","page_number":1}"#
        )
        .is_err());
    }
}
