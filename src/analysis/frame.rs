use anyhow::Result;
use arrow::{
    array::{Array, Float64Array, Int64Array, StringArray},
    record_batch::RecordBatch,
};

use crate::{error::PipelineError, table::LISTINGS};

/// The listing fields the analysis looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub id: Option<i64>,
    pub room_type: Option<String>,
    pub city: Option<String>,
    pub neighbourhood: Option<String>,
    pub price: Option<f64>,
    pub number_of_reviews: Option<i64>,
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    let arr = batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::MissingColumn {
            table: LISTINGS.name.to_string(),
            column: name.to_string(),
        })?;
    let typed = arr
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| PipelineError::ColumnType {
            table: LISTINGS.name.to_string(),
            column: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
            actual: arr.data_type().to_string(),
        })?;
    Ok(typed)
}

fn text(arr: &StringArray, i: usize) -> Option<String> {
    arr.is_valid(i).then(|| arr.value(i).to_string())
}

/// Pull the analysed fields out of a typed listings batch.
pub fn listing_rows(batch: &RecordBatch) -> Result<Vec<ListingRow>> {
    let id = column::<Int64Array>(batch, "id")?;
    let room_type = column::<StringArray>(batch, "room_type")?;
    let city = column::<StringArray>(batch, "city")?;
    let neighbourhood = column::<StringArray>(batch, "neighbourhood")?;
    let price = column::<Float64Array>(batch, "price")?;
    let reviews = column::<Int64Array>(batch, "number_of_reviews")?;

    Ok((0..batch.num_rows())
        .map(|i| ListingRow {
            id: id.is_valid(i).then(|| id.value(i)),
            room_type: text(room_type, i),
            city: text(city, i),
            neighbourhood: text(neighbourhood, i),
            price: price.is_valid(i).then(|| price.value(i)),
            number_of_reviews: reviews.is_valid(i).then(|| reviews.value(i)),
        })
        .collect())
}

/// Non-null prices of the rows matching `keep`.
pub fn prices_where<F>(rows: &[ListingRow], keep: F) -> Vec<f64>
where
    F: Fn(&ListingRow) -> bool,
{
    rows.iter()
        .filter(|r| keep(*r))
        .filter_map(|r| r.price)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::REVIEWS;
    use arrow::array::{new_null_array, ArrayRef};
    use std::sync::Arc;

    #[test]
    fn extracts_analysed_fields() -> Result<()> {
        let columns: Vec<ArrayRef> = LISTINGS
            .columns
            .iter()
            .map(|c| match c.name {
                "id" => Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
                "room_type" => Arc::new(StringArray::from(vec![Some("Private Room"), None])) as ArrayRef,
                "city" => Arc::new(StringArray::from(vec!["Berlin", "Munich"])) as ArrayRef,
                "price" => Arc::new(Float64Array::from(vec![None, Some(70.0)])) as ArrayRef,
                "number_of_reviews" => Arc::new(Int64Array::from(vec![3, 0])) as ArrayRef,
                _ => new_null_array(&c.kind.arrow_type(), 2),
            })
            .collect();
        let batch = RecordBatch::try_new(LISTINGS.arrow_schema(), columns)?;

        let rows = listing_rows(&batch)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].room_type.as_deref(), Some("Private Room"));
        assert_eq!(rows[0].price, None);
        assert_eq!(rows[1].neighbourhood, None);
        assert_eq!(rows[1].number_of_reviews, Some(0));
        assert_eq!(prices_where(&rows, |_| true), vec![70.0]);
        Ok(())
    }

    #[test]
    fn rejects_a_batch_without_listing_columns() {
        let reviews = RecordBatch::new_empty(REVIEWS.arrow_schema());
        let err = listing_rows(&reviews).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingColumn { .. })
        ));
    }
}
