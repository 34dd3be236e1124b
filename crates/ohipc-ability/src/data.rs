//! Data ability parcelables.
//!
//! Rows are [`ValuesBucket`]s of typed [`ValueObject`]s, filters are
//! [`DataAbilityPredicates`], and a query answers with a [`ResultSet`].
//! Batches are lists of [`DataAbilityOperation`] answered by one
//! [`DataAbilityResult`] each.

use std::collections::BTreeMap;

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use ohipc_types::Uri;
use serde::{Deserialize, Serialize};

const TYPE_NULL: u32 = 0;
const TYPE_INT: u32 = 1;
const TYPE_DOUBLE: u32 = 2;
const TYPE_STRING: u32 = 3;
const TYPE_BLOB: u32 = 4;
const TYPE_BOOL: u32 = 5;

/// One typed column value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ValueObject {
    /// SQL null.
    #[default]
    Null,
    /// Integer.
    Int(i64),
    /// Floating point.
    Double(f64),
    /// Text.
    String(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Boolean.
    Bool(bool),
}

impl ValueObject {
    fn tag(&self) -> u32 {
        match self {
            ValueObject::Null => TYPE_NULL,
            ValueObject::Int(_) => TYPE_INT,
            ValueObject::Double(_) => TYPE_DOUBLE,
            ValueObject::String(_) => TYPE_STRING,
            ValueObject::Blob(_) => TYPE_BLOB,
            ValueObject::Bool(_) => TYPE_BOOL,
        }
    }

    /// Text value, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueObject::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer value, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ValueObject::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl Parcelable for ValueObject {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_u32(self.tag())?;
        match self {
            ValueObject::Null => Ok(()),
            ValueObject::Int(value) => parcel.write_i64(*value),
            ValueObject::Double(value) => parcel.write_f64(*value),
            ValueObject::String(value) => parcel.write_string(value),
            ValueObject::Blob(value) => parcel.write_bytes(value),
            ValueObject::Bool(value) => parcel.write_bool(*value),
        }
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        match parcel.read_u32()? {
            TYPE_NULL => Ok(ValueObject::Null),
            TYPE_INT => Ok(ValueObject::Int(parcel.read_i64()?)),
            TYPE_DOUBLE => Ok(ValueObject::Double(parcel.read_f64()?)),
            TYPE_STRING => Ok(ValueObject::String(parcel.read_string()?)),
            TYPE_BLOB => Ok(ValueObject::Blob(parcel.read_bytes()?)),
            TYPE_BOOL => Ok(ValueObject::Bool(parcel.read_bool()?)),
            other => Err(ParcelError::invalid_enum("value type", other)),
        }
    }
}

impl From<i64> for ValueObject {
    fn from(value: i64) -> Self {
        ValueObject::Int(value)
    }
}

impl From<i32> for ValueObject {
    fn from(value: i32) -> Self {
        ValueObject::Int(i64::from(value))
    }
}

impl From<f64> for ValueObject {
    fn from(value: f64) -> Self {
        ValueObject::Double(value)
    }
}

impl From<bool> for ValueObject {
    fn from(value: bool) -> Self {
        ValueObject::Bool(value)
    }
}

impl From<&str> for ValueObject {
    fn from(value: &str) -> Self {
        ValueObject::String(value.to_owned())
    }
}

impl From<String> for ValueObject {
    fn from(value: String) -> Self {
        ValueObject::String(value)
    }
}

impl From<Vec<u8>> for ValueObject {
    fn from(value: Vec<u8>) -> Self {
        ValueObject::Blob(value)
    }
}

/// Column name to value map describing one row.
///
/// Written without a presence flag: interfaces that carry a bucket always
/// carry one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuesBucket {
    values: BTreeMap<String, ValueObject>,
}

impl ValuesBucket {
    /// Empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ValuesBucket::put`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ValueObject>) -> Self {
        self.put(column, value);
        self
    }

    /// Set `column`, returning the previous value.
    pub fn put(
        &mut self,
        column: impl Into<String>,
        value: impl Into<ValueObject>,
    ) -> Option<ValueObject> {
        self.values.insert(column.into(), value.into())
    }

    /// Value of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ValueObject> {
        self.values.get(column)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no column is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Columns and values in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueObject)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Parcelable for ValuesBucket {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_count(self.values.len())?;
        for (column, value) in &self.values {
            parcel.write_string(column)?;
            value.marshal(parcel)?;
        }
        Ok(())
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let count = parcel.read_count()?;
        let mut values = BTreeMap::new();
        for _ in 0..count {
            let column = parcel.read_string()?;
            values.insert(column, ValueObject::unmarshal(parcel)?);
        }
        Ok(Self { values })
    }
}

/// Row filter of a data ability request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAbilityPredicates {
    /// `WHERE` clause with `?` placeholders.
    pub where_clause: String,
    /// Placeholder values.
    pub where_args: Vec<String>,
    /// `ORDER BY` clause.
    pub order_by: String,
    /// Row limit, `None` for unlimited.
    pub limit: Option<u32>,
    /// Rows to skip.
    pub offset: u32,
    /// Whether duplicate rows are collapsed.
    pub distinct: bool,
}

impl DataAbilityPredicates {
    /// Filter on `where_clause`.
    #[must_use]
    pub fn new(where_clause: impl Into<String>) -> Self {
        Self {
            where_clause: where_clause.into(),
            ..Self::default()
        }
    }

    /// Add a placeholder value.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.where_args.push(arg.into());
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Limit the number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Parcelable for DataAbilityPredicates {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string(&self.where_clause)?;
        parcel.write_string_vector(&self.where_args)?;
        parcel.write_string(&self.order_by)?;
        match self.limit {
            Some(limit) => {
                parcel.write_bool(true)?;
                parcel.write_u32(limit)?;
            }
            None => parcel.write_bool(false)?,
        }
        parcel.write_u32(self.offset)?;
        parcel.write_bool(self.distinct)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let where_clause = parcel.read_string()?;
        let where_args = parcel.read_string_vector()?;
        let order_by = parcel.read_string()?;
        let limit = if parcel.read_bool()? {
            Some(parcel.read_u32()?)
        } else {
            None
        };
        Ok(Self {
            where_clause,
            where_args,
            order_by,
            limit,
            offset: parcel.read_u32()?,
            distinct: parcel.read_bool()?,
        })
    }
}

/// Kind of a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum OperationType {
    /// Insert a row.
    Insert = 1,
    /// Update matching rows.
    Update = 2,
    /// Delete matching rows.
    Delete = 3,
    /// Check the number of matching rows.
    Assert = 4,
}

impl OperationType {
    /// Wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    fn from_code(code: i32) -> ParcelResult<Self> {
        match code {
            1 => Ok(Self::Insert),
            2 => Ok(Self::Update),
            3 => Ok(Self::Delete),
            4 => Ok(Self::Assert),
            other => Err(ParcelError::invalid_enum("operation type", other.cast_unsigned())),
        }
    }
}

/// One step of an `ExecuteBatch` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAbilityOperation {
    /// What to do.
    pub op_type: OperationType,
    /// Target URI.
    pub uri: Uri,
    /// Row values for inserts and updates.
    pub values: Option<ValuesBucket>,
    /// Row filter for updates, deletes and asserts.
    pub predicates: Option<DataAbilityPredicates>,
    /// Expected affected row count, 0 when unchecked.
    pub expected_count: i32,
    /// Whether the batch may yield after this step.
    pub interrupted: bool,
}

impl DataAbilityOperation {
    fn new(op_type: OperationType, uri: Uri) -> Self {
        Self {
            op_type,
            uri,
            values: None,
            predicates: None,
            expected_count: 0,
            interrupted: false,
        }
    }

    /// Insert `values` under `uri`.
    #[must_use]
    pub fn insert(uri: impl Into<Uri>, values: ValuesBucket) -> Self {
        Self {
            values: Some(values),
            ..Self::new(OperationType::Insert, uri.into())
        }
    }

    /// Update rows of `uri` matching `predicates`.
    #[must_use]
    pub fn update(
        uri: impl Into<Uri>,
        values: ValuesBucket,
        predicates: DataAbilityPredicates,
    ) -> Self {
        Self {
            values: Some(values),
            predicates: Some(predicates),
            ..Self::new(OperationType::Update, uri.into())
        }
    }

    /// Delete rows of `uri` matching `predicates`.
    #[must_use]
    pub fn delete(uri: impl Into<Uri>, predicates: DataAbilityPredicates) -> Self {
        Self {
            predicates: Some(predicates),
            ..Self::new(OperationType::Delete, uri.into())
        }
    }

    /// Check that `expected_count` rows of `uri` match `predicates`.
    #[must_use]
    pub fn assert(uri: impl Into<Uri>, predicates: DataAbilityPredicates, expected_count: i32) -> Self {
        Self {
            predicates: Some(predicates),
            expected_count,
            ..Self::new(OperationType::Assert, uri.into())
        }
    }
}

impl Parcelable for DataAbilityOperation {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_i32(self.op_type.code())?;
        parcel.write_parcelable(Some(&self.uri))?;
        parcel.write_parcelable(self.values.as_ref())?;
        parcel.write_parcelable(self.predicates.as_ref())?;
        parcel.write_i32(self.expected_count)?;
        parcel.write_bool(self.interrupted)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            op_type: OperationType::from_code(parcel.read_i32()?)?,
            uri: parcel.read_required_parcelable("operation uri")?,
            values: parcel.read_parcelable()?,
            predicates: parcel.read_parcelable()?,
            expected_count: parcel.read_i32()?,
            interrupted: parcel.read_bool()?,
        })
    }
}

/// Outcome of one batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAbilityResult {
    /// URI of an inserted row.
    pub uri: Option<Uri>,
    /// Affected row count.
    pub count: i32,
}

impl DataAbilityResult {
    /// Result affecting `count` rows.
    #[must_use]
    pub fn count(count: i32) -> Self {
        Self { uri: None, count }
    }

    /// Result naming an inserted row.
    #[must_use]
    pub fn inserted(uri: impl Into<Uri>) -> Self {
        Self {
            uri: Some(uri.into()),
            count: 1,
        }
    }
}

impl Parcelable for DataAbilityResult {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_nullable_string(self.uri.as_ref().map(Uri::as_str))?;
        parcel.write_i32(self.count)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            uri: parcel.read_nullable_string()?.map(Uri::from),
            count: parcel.read_i32()?,
        })
    }
}

/// Rows answering a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<ValueObject>>,
}

impl ResultSet {
    /// Empty result with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    #[must_use]
    pub fn with_row(mut self, mut row: Vec<ValueObject>) -> Self {
        row.resize(self.columns.len(), ValueObject::Null);
        self.rows.push(row);
        self
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value at `row` in the column named `column`.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&ValueObject> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

impl Parcelable for ResultSet {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string_vector(&self.columns)?;
        parcel.write_count(self.rows.len())?;
        for row in &self.rows {
            parcel.write_vec(row)?;
        }
        Ok(())
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let columns = parcel.read_string_vector()?;
        let count = parcel.read_count()?;
        let mut rows = Vec::new();
        for _ in 0..count {
            let row: Vec<ValueObject> = parcel.read_vec()?;
            if row.len() != columns.len() {
                return Err(ParcelError::InvalidLength(i32::try_from(row.len()).unwrap_or(i32::MAX)));
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_wire_is_sorted_by_column() -> ParcelResult<()> {
        let bucket = ValuesBucket::new().with("name", "lamp").with("id", 7);
        let mut parcel = MessageParcel::new();
        bucket.marshal(&mut parcel)?;
        assert_eq!(parcel.read_i32()?, 2);
        assert_eq!(parcel.read_string()?, "id");
        assert_eq!(parcel.read_u32()?, TYPE_INT);
        assert_eq!(parcel.read_i64()?, 7);
        assert_eq!(parcel.read_string()?, "name");
        Ok(())
    }

    #[test]
    fn test_unknown_value_type() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_u32(9)?;
        assert!(matches!(
            ValueObject::unmarshal(&mut parcel),
            Err(ParcelError::InvalidEnum { value: 9, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_operation_requires_uri() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(OperationType::Delete.code())?;
        parcel.write_parcelable::<Uri>(None)?;
        assert!(matches!(
            DataAbilityOperation::unmarshal(&mut parcel),
            Err(ParcelError::UnexpectedNull("operation uri"))
        ));
        Ok(())
    }

    #[test]
    fn test_result_set_rows_are_padded() {
        let set = ResultSet::new(["id", "name"]).with_row(vec![ValueObject::Int(1)]);
        assert_eq!(set.row_count(), 1);
        assert_eq!(set.get(0, "name"), Some(&ValueObject::Null));
        assert_eq!(set.get(0, "id").and_then(ValueObject::as_i64), Some(1));
        assert_eq!(set.get(1, "id"), None);
    }

    #[test]
    fn test_ragged_row_rejected() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_string_vector(&["id"])?;
        parcel.write_i32(1)?;
        parcel.write_vec(&[ValueObject::Int(1), ValueObject::Null])?;
        assert!(matches!(
            ResultSet::unmarshal(&mut parcel),
            Err(ParcelError::InvalidLength(2))
        ));
        Ok(())
    }
}
