//! Tag index built from the comma-separated `tags` column.

use std::collections::HashMap;

use crate::dataset::Dataset;

/// How many tags the tag picker offers.
pub const TOP_TAG_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Split a raw tag string into lowercased, trimmed, non-empty tokens.
///
/// Repeated tokens are yielded every time they occur.
pub fn split_tags(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
}

/// Count every tag occurrence across the dataset.
///
/// Sorted by descending count; equal counts keep first-appearance order.
pub fn tag_counts(dataset: &Dataset) -> Vec<TagCount> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<TagCount> = Vec::new();

    for record in &dataset.records {
        for tag in split_tags(&record.tags) {
            match positions.get(&tag) {
                Some(&idx) => counts[idx].count += 1,
                None => {
                    positions.insert(tag.clone(), counts.len());
                    counts.push(TagCount { tag, count: 1 });
                }
            }
        }
    }

    // stable: ties stay in insertion order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `limit` most frequent tags, most frequent first.
pub fn top_tags(dataset: &Dataset, limit: usize) -> Vec<String> {
    tag_counts(dataset)
        .into_iter()
        .take(limit)
        .map(|c| c.tag)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_from_reader;

    fn dataset_with_tags(tags: &[&str]) -> Dataset {
        let mut csv = String::from("id,title,tags,url,lat,lon\n");
        for (i, t) in tags.iter().enumerate() {
            csv.push_str(&format!("{},t,\"{}\",u,45.0,4.0\n", i, t));
        }
        load_from_reader(csv.as_bytes(), "tags.csv").unwrap()
    }

    #[test]
    fn test_split_tags_normalizes() {
        let tags: Vec<String> = split_tags(" Lyon ,FRANCE,, ,vieux lyon").collect();
        assert_eq!(tags, vec!["lyon", "france", "vieux lyon"]);
    }

    #[test]
    fn test_most_frequent_tag_first() {
        let dataset = dataset_with_tags(&["a,b", "a,c", "a"]);
        let counts = tag_counts(&dataset);

        assert_eq!(counts[0], TagCount { tag: "a".to_string(), count: 3 });
        assert_eq!(top_tags(&dataset, TOP_TAG_LIMIT), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repeats_within_a_record_count_twice() {
        let dataset = dataset_with_tags(&["x, x", "y"]);
        let counts = tag_counts(&dataset);
        assert_eq!(counts[0], TagCount { tag: "x".to_string(), count: 2 });
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        let dataset = dataset_with_tags(&["zeta", "alpha", "Zeta,alpha", "mid"]);
        assert_eq!(top_tags(&dataset, 10), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_limit_truncates() {
        let tags: Vec<String> = (0..250).map(|i| format!("tag{}", i)).collect();
        let joined = tags.join(",");
        let dataset = dataset_with_tags(&[joined.as_str()]);

        let top = top_tags(&dataset, TOP_TAG_LIMIT);
        assert_eq!(top.len(), 200);
        assert_eq!(top[0], "tag0");
    }

    #[test]
    fn test_empty_tags_yield_nothing() {
        let dataset = dataset_with_tags(&["", " , "]);
        assert!(top_tags(&dataset, TOP_TAG_LIMIT).is_empty());
    }
}
