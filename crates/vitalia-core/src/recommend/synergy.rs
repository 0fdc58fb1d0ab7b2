//! Catalog of products that complement each other.
//!
//! The table is symmetric for lookups: if A lists B, `is_complement(B, A)`
//! also holds even when B's own row omits A.

use std::collections::BTreeMap;

/// Static complement table, keyed by product id.
#[derive(Debug, Clone)]
pub struct SynergyTable {
    complements: BTreeMap<String, Vec<String>>,
}

impl Default for SynergyTable {
    fn default() -> Self {
        Self::from_pairs(&[
            ("Magnesium Complex", &["Calcium", "Vitamin D", "Vitamin B6"][..]),
            ("Magnesium Evening", &["Magnesium Complex", "Vitamin B Complex"]),
            ("Silicitin", &["Biteron-H", "Vitamin E"]),
            ("Argent Max", &["Vitamin C", "BARS-2", "Solberry"]),
            ("Vitamin C", &["Argent Max", "Zinc", "Iron"]),
            ("BARS-2", &["Argent Max", "Vitamin C", "Magnesium Complex"]),
            ("Solberry", &["Vitamin C", "Vitamin E", "Argent Max"]),
            ("Biteron-H", &["Silicitin", "Vitamin C", "Solberry"]),
        ])
    }
}

impl SynergyTable {
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let complements = pairs
            .iter()
            .map(|(product, partners)| {
                (
                    (*product).to_string(),
                    partners.iter().map(|p| (*p).to_string()).collect(),
                )
            })
            .collect();
        Self { complements }
    }

    /// Products listed as complements of `product_id`.
    pub fn complements(&self, product_id: &str) -> &[String] {
        self.complements
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Symmetric complement check.
    pub fn is_complement(&self, a: &str, b: &str) -> bool {
        self.complements(a).iter().any(|p| p == b)
            || self.complements(b).iter().any(|p| p == a)
    }

    /// Whether the catalog knows this product at all, as a row or partner.
    pub fn contains(&self, product_id: &str) -> bool {
        self.complements.contains_key(product_id)
            || self
                .complements
                .values()
                .any(|partners| partners.iter().any(|p| p == product_id))
    }

    /// Catalog products usable as a last-resort candidate pool.
    ///
    /// Ordered by id so degraded answers are deterministic.
    pub fn fallback_candidates(&self, limit: usize) -> Vec<String> {
        self.complements.keys().take(limit).cloned().collect()
    }

    /// Find catalog product names mentioned in free text.
    ///
    /// Matches are case-insensitive, require word boundaries on both sides
    /// ("vitamin complex" is not a "Vitamin C" mention), and are returned
    /// in order of appearance, so the last element is the most recently
    /// mentioned product.
    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut found: Vec<(usize, String)> = Vec::new();
        let mut seen = |name: &str, found: &mut Vec<(usize, String)>| {
            if let Some(pos) = find_word(&lowered, &name.to_lowercase()) {
                if !found.iter().any(|(_, n)| n == name) {
                    found.push((pos, name.to_string()));
                }
            }
        };
        for (product, partners) in &self.complements {
            seen(product, &mut found);
            for partner in partners {
                seen(partner, &mut found);
            }
        }
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, name)| name).collect()
    }
}

/// First occurrence of `needle` in `haystack` bounded by non-alphanumeric
/// characters (or the string ends) on both sides.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut start = 0;
    while let Some(offset) = haystack[start..].find(needle) {
        let pos = start + offset;
        let end = pos + needle.len();
        let bounded_left = haystack[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let bounded_right = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if bounded_left && bounded_right {
            return Some(pos);
        }
        start = end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complements_lookup() {
        let table = SynergyTable::default();
        let partners = table.complements("Magnesium Complex");
        assert!(partners.contains(&"Calcium".to_string()));
        assert!(table.complements("Unknown Product").is_empty());
    }

    #[test]
    fn test_is_complement_symmetric() {
        let table = SynergyTable::default();
        assert!(table.is_complement("Magnesium Complex", "Calcium"));
        // Calcium has no row of its own; symmetry still holds
        assert!(table.is_complement("Calcium", "Magnesium Complex"));
        assert!(!table.is_complement("Calcium", "Solberry"));
    }

    #[test]
    fn test_contains_partners_too() {
        let table = SynergyTable::default();
        assert!(table.contains("Vitamin C"));
        assert!(table.contains("Zinc"));
        assert!(!table.contains("Snake Oil"));
    }

    #[test]
    fn test_fallback_candidates_ordered() {
        let table = SynergyTable::default();
        let pool = table.fallback_candidates(3);
        assert_eq!(pool.len(), 3);
        let mut sorted = pool.clone();
        sorted.sort();
        assert_eq!(pool, sorted);
    }

    #[test]
    fn test_extract_entities_in_order_of_appearance() {
        let table = SynergyTable::default();
        let entities =
            table.extract_entities("Is Vitamin C better than Magnesium Complex for winter?");
        assert_eq!(
            entities,
            vec!["Vitamin C".to_string(), "Magnesium Complex".to_string()]
        );
        assert!(table.extract_entities("nothing relevant here").is_empty());
    }

    #[test]
    fn test_extract_entities_requires_word_boundaries() {
        let table = SynergyTable::default();
        // A prefix of a longer word must not count as a mention
        assert!(table.extract_entities("any good vitamin complex?").is_empty());
        assert!(table.extract_entities("my zinciest smoothie yet").is_empty());
        assert_eq!(
            table.extract_entities("is vitamin c okay with food"),
            vec!["Vitamin C".to_string()]
        );
    }
}
