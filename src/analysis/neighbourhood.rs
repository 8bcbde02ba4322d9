use std::collections::HashMap;

use super::frame::ListingRow;

/// Groups need strictly more listings than this to be charted.
pub const MIN_LISTINGS_EXCLUSIVE: usize = 10;
pub const TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct NeighbourhoodPrice {
    /// `"<city> - <neighbourhood>"`
    pub label: String,
    /// NaN when no listing in the group has a price.
    pub mean_price: f64,
    pub listing_count: usize,
}

/// Mean price and listing count per (city, neighbourhood). Rows missing
/// either key are not grouped.
pub fn neighbourhood_prices(rows: &[ListingRow]) -> Vec<NeighbourhoodPrice> {
    #[derive(Default)]
    struct Acc {
        listings: usize,
        priced: usize,
        sum: f64,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Acc> = HashMap::new();
    for r in rows {
        let (Some(city), Some(hood)) = (r.city.as_deref(), r.neighbourhood.as_deref()) else {
            continue;
        };
        let label = format!("{city} - {hood}");
        let acc = groups.entry(label.clone()).or_insert_with(|| {
            order.push(label);
            Acc::default()
        });
        acc.listings += 1;
        if let Some(p) = r.price {
            acc.priced += 1;
            acc.sum += p;
        }
    }

    order
        .into_iter()
        .filter_map(|label| {
            let acc = groups.remove(&label)?;
            let mean_price = if acc.priced == 0 {
                f64::NAN
            } else {
                acc.sum / acc.priced as f64
            };
            Some(NeighbourhoodPrice {
                label,
                mean_price,
                listing_count: acc.listings,
            })
        })
        .collect()
}

/// Groups with more than `MIN_LISTINGS_EXCLUSIVE` listings, most expensive
/// first (unpriced groups last), cut to `TOP_N`.
pub fn heatmap_groups(rows: &[ListingRow]) -> Vec<NeighbourhoodPrice> {
    let mut popular: Vec<NeighbourhoodPrice> = neighbourhood_prices(rows)
        .into_iter()
        .filter(|g| g.listing_count > MIN_LISTINGS_EXCLUSIVE)
        .collect();
    popular.sort_by(|a, b| match (a.mean_price.is_nan(), b.mean_price.is_nan()) {
        (false, false) => b.mean_price.total_cmp(&a.mean_price),
        (nan_a, nan_b) => nan_a.cmp(&nan_b),
    });
    popular.truncate(TOP_N);
    popular
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frame::fixtures::row;

    fn many(city: &str, hood: &str, n: usize, price: f64) -> Vec<ListingRow> {
        (0..n).map(|_| row(city, hood, "Private Room", Some(price))).collect()
    }

    #[test]
    fn groups_by_city_and_neighbourhood() {
        let mut rows = many("Berlin", "Mitte", 2, 100.0);
        rows.push(row("Berlin", "Mitte", "Private Room", None));
        rows.push(row("Munich", "Mitte", "Private Room", Some(10.0)));
        let mut orphan = row("Berlin", "x", "Private Room", Some(1.0));
        orphan.neighbourhood = None;
        rows.push(orphan);

        let groups = neighbourhood_prices(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Berlin - Mitte");
        assert_eq!(groups[0].listing_count, 3);
        assert_eq!(groups[0].mean_price, 100.0);
        assert_eq!(groups[1].label, "Munich - Mitte");
    }

    #[test]
    fn eleven_listings_included_ten_excluded() {
        let mut rows = many("Berlin", "Mitte", 11, 120.0);
        rows.extend(many("Berlin", "Pankow", 10, 500.0));

        let groups = heatmap_groups(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Berlin - Mitte");
        assert_eq!(groups[0].listing_count, 11);
        assert!(groups.iter().all(|g| g.listing_count > 10));
    }

    #[test]
    fn sorted_descending_and_capped() {
        let mut rows = Vec::new();
        for i in 0..25 {
            rows.extend(many("Munich", &format!("District {i}"), 11, 10.0 * i as f64));
        }
        let mut unpriced = many("Munich", "Nowhere", 11, 0.0);
        unpriced.iter_mut().for_each(|r| r.price = None);
        rows.extend(unpriced);

        let groups = heatmap_groups(&rows);
        assert_eq!(groups.len(), TOP_N);
        assert_eq!(groups[0].label, "Munich - District 24");
        assert_eq!(groups[19].label, "Munich - District 5");
        assert!(groups
            .windows(2)
            .all(|w| w[0].mean_price >= w[1].mean_price));
    }

    #[test]
    fn unpriced_groups_sort_last() {
        let mut rows = many("Berlin", "A", 11, 50.0);
        let mut none = many("Berlin", "B", 11, 0.0);
        none.iter_mut().for_each(|r| r.price = None);
        rows.extend(none);
        rows.extend(many("Berlin", "C", 11, 80.0));

        let labels: Vec<String> = heatmap_groups(&rows).into_iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["Berlin - C", "Berlin - A", "Berlin - B"]);
    }
}
