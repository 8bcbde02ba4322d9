use std::collections::HashMap;

use super::frame::ListingRow;

/// Count, mean, sample std and five-number summary of the non-null prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl PriceSummary {
    /// All fields NaN when `values` is empty; `std` is NaN below two values.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            count: values.len(),
            mean: mean(values),
            std: sample_std(values),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Counts per category, highest first; ties keep first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCounts(pub Vec<(String, usize)>);

impl ValueCounts {
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for v in values.into_iter().flatten() {
            let n = counts.entry(v.to_string()).or_insert_with(|| {
                order.push(v.to_string());
                0
            });
            *n += 1;
        }
        let mut out: Vec<(String, usize)> = order
            .into_iter()
            .map(|k| {
                let n = counts[&k];
                (k, n)
            })
            .collect();
        // stable sort keeps first-appearance order among equal counts
        out.sort_by(|a, b| b.1.cmp(&a.1));
        Self(out)
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, n)| *n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub total_listings: usize,
    pub total_reviews: usize,
    /// Distinct room types in first-appearance order.
    pub room_types: Vec<String>,
    pub room_type_counts: ValueCounts,
    pub cities: Vec<String>,
    pub city_counts: ValueCounts,
    pub price: PriceSummary,
}

pub fn describe(rows: &[ListingRow], total_reviews: usize) -> Overview {
    let room_type_counts = ValueCounts::from_values(rows.iter().map(|r| r.room_type.as_deref()));
    let city_counts = ValueCounts::from_values(rows.iter().map(|r| r.city.as_deref()));
    let prices: Vec<f64> = rows.iter().filter_map(|r| r.price).collect();

    Overview {
        total_listings: rows.len(),
        total_reviews,
        room_types: first_appearance(rows.iter().map(|r| r.room_type.as_deref())),
        room_type_counts,
        cities: first_appearance(rows.iter().map(|r| r.city.as_deref())),
        city_counts,
        price: PriceSummary::from_values(&prices),
    }
}

fn first_appearance<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen: Vec<String> = Vec::new();
    for v in values.into_iter().flatten() {
        if !seen.iter().any(|s| s == v) {
            seen.push(v.to_string());
        }
    }
    seen
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance with the n-1 denominator; NaN below two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Linear-interpolation quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}
