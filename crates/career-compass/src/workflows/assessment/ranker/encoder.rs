use std::collections::BTreeSet;

/// Bidirectional career label <-> class id mapping. Classes are kept in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = labels.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Rebuild from persisted classes; `None` unless strictly increasing and non-empty.
    pub fn from_classes(classes: Vec<String>) -> Option<Self> {
        if classes.is_empty() || classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return None;
        }
        Some(Self { classes })
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .ok()
    }

    pub fn decode(&self, class_id: usize) -> Option<&str> {
        self.classes.get(class_id).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_sorts_and_deduplicates() {
        let encoder = LabelEncoder::fit(["Y", "X", "Y", "Teaching"]);
        assert_eq!(encoder.classes(), ["Teaching", "X", "Y"]);
        assert_eq!(encoder.encode("X"), Some(1));
        assert_eq!(encoder.decode(2), Some("Y"));
        assert_eq!(encoder.encode("Z"), None);
        assert_eq!(encoder.decode(3), None);
    }

    #[test]
    fn from_classes_rejects_unsorted_or_duplicate_lists() {
        assert!(LabelEncoder::from_classes(vec!["B".into(), "A".into()]).is_none());
        assert!(LabelEncoder::from_classes(vec!["A".into(), "A".into()]).is_none());
        assert!(LabelEncoder::from_classes(Vec::new()).is_none());
        assert!(LabelEncoder::from_classes(vec!["A".into(), "B".into()]).is_some());
    }
}
