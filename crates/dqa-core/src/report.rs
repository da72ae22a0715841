use crate::reconcile::ComparisonReport;
use crate::sources::SourceKind;
use polars::prelude::*;

impl ComparisonReport {
    /// Tabular view of the per-key rows, one column per source.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(7);

        let keys: Vec<String> = self.rows.iter().map(|r| r.key.to_string()).collect();
        columns.push(Series::new(PlSmallStr::from_static("key"), keys).into_column());

        for kind in SourceKind::ALL {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.value(kind)).collect();
            columns.push(Series::new(PlSmallStr::from_static(kind.as_str()), values).into_column());
        }

        let missing: Vec<u32> = self.rows.iter().map(|r| r.missing_count as u32).collect();
        columns.push(Series::new(PlSmallStr::from_static("missing_count"), missing).into_column());

        let mismatch: Vec<bool> = self.rows.iter().map(|r| r.mismatch).collect();
        columns.push(Series::new(PlSmallStr::from_static("mismatch"), mismatch).into_column());

        DataFrame::new(columns)
    }
}
