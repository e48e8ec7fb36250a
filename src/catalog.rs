//! Device catalog: a static seed tree merged at read time with rows from the
//! `device_models` table. The seed is never removed by a merge and duplicate
//! (brand, model) pairs collapse to one entry.

use std::collections::BTreeMap;

/// category → brand → model names
pub type DeviceTree = BTreeMap<String, BTreeMap<String, Vec<String>>>;

pub fn seed_tree() -> DeviceTree {
    let seed: &[(&str, &[(&str, &[&str])])] = &[
        (
            "Phone",
            &[
                (
                    "Apple",
                    &["iPhone 15 Pro", "iPhone 15", "iPhone 14", "iPhone 13", "iPhone SE"],
                ),
                (
                    "Samsung",
                    &["Galaxy S24", "Galaxy S23", "Galaxy A54", "Galaxy Z Flip 5"],
                ),
                ("Google", &["Pixel 8 Pro", "Pixel 8", "Pixel 7a"]),
            ],
        ),
        (
            "Tablet",
            &[
                ("Apple", &["iPad Pro 12.9", "iPad Air", "iPad Mini"]),
                ("Samsung", &["Galaxy Tab S9", "Galaxy Tab A9"]),
            ],
        ),
        (
            "Laptop",
            &[
                ("Apple", &["MacBook Pro 14", "MacBook Air M2"]),
                ("Lenovo", &["ThinkPad X1 Carbon", "IdeaPad 5"]),
                ("Dell", &["XPS 13", "Latitude 7440"]),
            ],
        ),
        (
            "Smartwatch",
            &[
                ("Apple", &["Watch Series 9", "Watch SE"]),
                ("Samsung", &["Galaxy Watch 6"]),
            ],
        ),
        (
            "Console",
            &[
                ("Sony", &["PlayStation 5"]),
                ("Microsoft", &["Xbox Series X"]),
                ("Nintendo", &["Switch OLED"]),
            ],
        ),
    ];

    seed.iter()
        .map(|(category, brands)| {
            let brands = brands
                .iter()
                .map(|(brand, models)| {
                    (
                        brand.to_string(),
                        models.iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect();
            (category.to_string(), brands)
        })
        .collect()
}

/// Flat (category, brand, model) view of the seed, used when planting the
/// seed into the `device_models` table.
pub fn seed_rows() -> Vec<(String, String, String)> {
    let mut rows = Vec::new();
    for (category, brands) in seed_tree() {
        for (brand, models) in brands {
            for model in models {
                rows.push((category.clone(), brand.clone(), model));
            }
        }
    }
    rows
}

/// Merge fetched rows into a copy of the seed tree. Missing category/brand
/// containers are created; a model already present under its brand is
/// skipped.
pub fn merge(seed: &DeviceTree, rows: &[(String, String, String)]) -> DeviceTree {
    let mut tree = seed.clone();
    for (category, brand, model) in rows {
        let models = tree
            .entry(category.clone())
            .or_default()
            .entry(brand.clone())
            .or_default();
        if !models.iter().any(|existing| existing == model) {
            models.push(model.clone());
        }
    }
    tree
}

/// Reverse lookup: first (category, brand) pair whose model list contains
/// the given name. Drives deep links that arrive with only a model name.
pub fn find_model<'a>(tree: &'a DeviceTree, model: &str) -> Option<(&'a str, &'a str)> {
    for (category, brands) in tree {
        for (brand, models) in brands {
            if models.iter().any(|m| m == model) {
                return Some((category.as_str(), brand.as_str()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, brand: &str, model: &str) -> (String, String, String) {
        (category.to_string(), brand.to_string(), model.to_string())
    }

    #[test]
    fn merge_keeps_every_seed_entry() {
        let seed = seed_tree();
        let merged = merge(&seed, &[row("Phone", "Apple", "iPhone 12")]);
        for (category, brands) in &seed {
            for (brand, models) in brands {
                for model in models {
                    assert!(
                        merged[category][brand].contains(model),
                        "lost {category}/{brand}/{model}"
                    );
                }
            }
        }
    }

    #[test]
    fn merge_creates_missing_category_and_brand() {
        let merged = merge(&seed_tree(), &[row("Drone", "DJI", "Mini 4 Pro")]);
        assert_eq!(merged["Drone"]["DJI"], vec!["Mini 4 Pro".to_string()]);
    }

    #[test]
    fn merge_skips_duplicate_brand_model_pairs() {
        let rows = [
            row("Phone", "Apple", "iPhone 15"),
            row("Phone", "Apple", "iPhone 15"),
        ];
        let merged = merge(&seed_tree(), &rows);
        let count = merged["Phone"]["Apple"]
            .iter()
            .filter(|m| m.as_str() == "iPhone 15")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn reverse_lookup_finds_seeded_model() {
        let tree = seed_tree();
        assert_eq!(find_model(&tree, "iPhone 15"), Some(("Phone", "Apple")));
        assert_eq!(find_model(&tree, "Galaxy Tab S9"), Some(("Tablet", "Samsung")));
    }

    #[test]
    fn reverse_lookup_misses_unknown_model() {
        assert_eq!(find_model(&seed_tree(), "Fairphone 5"), None);
    }

    #[test]
    fn empty_fetch_leaves_seed_untouched() {
        assert_eq!(merge(&seed_tree(), &[]), seed_tree());
    }
}
