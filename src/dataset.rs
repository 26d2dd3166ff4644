//! Tabular datasets and the attribute catalog used to move between nominal
//! labels and the normalized vectors the numeric learners consume.

use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::error::{check_len, Error, Result};

/// A single cell of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Nominal(String),
    Numeric(f64),
}

impl Value {
    /// Creates a nominal value.
    pub fn nominal<S: Into<String>>(label: S) -> Self {
        Value::Nominal(label.into())
    }

    /// Returns the label of a nominal value.
    pub fn as_nominal(&self) -> Option<&str> {
        match self {
            Value::Nominal(label) => Some(label),
            Value::Numeric(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nominal(label) => f.write_str(label),
            Value::Numeric(x) => write!(f, "{}", x),
        }
    }
}

/// What a learner does with an attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Usage {
    Input,
    Output,
    Ignore,
}

/// The values an attribute may take.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Kind {
    /// One of a fixed, ordered set of labels.
    Nominal(Vec<String>),
    /// A real number in `[min, max]`.
    Numeric { min: f64, max: f64 },
}

/// A named column of a `Table`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub usage: Usage,
    pub kind: Kind,
}

impl Attribute {
    /// Creates a nominal attribute with the given labels in catalog order.
    pub fn nominal(name: &str, usage: Usage, levels: &[&str]) -> Self {
        Attribute {
            name: name.into(),
            usage,
            kind: Kind::Nominal(levels.iter().map(|&l| l.into()).collect()),
        }
    }

    /// Creates a numeric attribute ranging over `[min, max]`.
    pub fn numeric(name: &str, usage: Usage, min: f64, max: f64) -> Self {
        Attribute {
            name: name.into(),
            usage,
            kind: Kind::Numeric { min, max },
        }
    }

    /// Returns the labels of a nominal attribute.
    pub fn levels(&self) -> Option<&[String]> {
        match &self.kind {
            Kind::Nominal(levels) => Some(levels),
            Kind::Numeric { .. } => None,
        }
    }

    /// Maps `value` into `[0, 1]`.
    ///
    /// Nominal levels are spread evenly over the interval in catalog order and
    /// numeric values are min-max scaled.
    pub fn normalize(&self, value: &Value) -> Result<f64> {
        match (&self.kind, value) {
            (Kind::Nominal(levels), Value::Nominal(label)) => {
                let index = levels
                    .iter()
                    .position(|l| l == label)
                    .ok_or_else(|| self.invalid(value))?;
                Ok(level_code(index, levels.len()))
            }
            (&Kind::Numeric { min, max }, &Value::Numeric(x)) => {
                if max > min {
                    Ok((x - min) / (max - min))
                } else {
                    Ok(0.0)
                }
            }
            _ => Err(self.invalid(value)),
        }
    }

    /// Maps a normalized value back to a `(confidence, label)` pair.
    ///
    /// A nominal value snaps to the nearest level; confidence falls from 1 at
    /// the level's code to 0 halfway to its neighbour. Numeric values are
    /// rescaled with full confidence.
    pub fn undo_normalize(&self, x: f64) -> (f64, String) {
        match &self.kind {
            Kind::Nominal(levels) if levels.len() > 1 => {
                let top = levels.len() - 1;
                let step = 1.0 / top as f64;
                let index = ((x / step).round().max(0.0) as usize).min(top);
                let distance = (x - level_code(index, levels.len())).abs();
                let confidence = (1.0 - 2.0 * distance / step).clamp(0.0, 1.0);
                (confidence, levels[index].clone())
            }
            Kind::Nominal(levels) => (1.0, levels.first().cloned().unwrap_or_default()),
            &Kind::Numeric { min, max } => (1.0, format!("{}", min + x * (max - min))),
        }
    }

    /// Converts a normalized value back into a cell value.
    pub fn decode(&self, x: f64) -> Value {
        match &self.kind {
            Kind::Nominal(_) => Value::Nominal(self.undo_normalize(x).1),
            &Kind::Numeric { min, max } => Value::Numeric(min + x * (max - min)),
        }
    }

    fn invalid(&self, value: &Value) -> Error {
        Error::InvalidValue {
            attribute: self.name.clone(),
            value: value.to_string(),
        }
    }
}

fn level_code(index: usize, levels: usize) -> f64 {
    if levels > 1 {
        index as f64 / (levels - 1) as f64
    } else {
        0.0
    }
}

/// Reverses normalization of model outputs.
pub trait Normalizer {
    /// Returns one `(confidence, label)` pair per attribute, where `values[i]`
    /// is the normalized value of `attributes[i]`.
    fn undo_normalize(
        &self,
        attributes: &[Attribute],
        values: &[f64],
    ) -> Result<Vec<(f64, String)>>;
}

/// Undoes normalization using only the attribute catalog.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogNormalizer;

impl Normalizer for CatalogNormalizer {
    fn undo_normalize(
        &self,
        attributes: &[Attribute],
        values: &[f64],
    ) -> Result<Vec<(f64, String)>> {
        check_len("normalized values", attributes.len(), values.len())?;
        Ok(attributes
            .iter()
            .zip(values)
            .map(|(attribute, &x)| attribute.undo_normalize(x))
            .collect())
    }
}

/// A dataset that can be fed to the numeric learners.
pub trait DataSource {
    type Normalizer: Normalizer;

    /// Number of examples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns parallel arrays of normalized input and output vectors.
    fn normalized_data(&self) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)>;

    /// The normalizer that reverses `normalized_data`.
    fn normalizer(&self) -> &Self::Normalizer;

    /// The attributes making up each output vector, in order.
    fn output_attributes(&self) -> Vec<Attribute>;
}

/// An in-memory table of records described by an attribute catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    attributes: Vec<Attribute>,
    records: Vec<Vec<Value>>,
    #[serde(skip)]
    normalizer: CatalogNormalizer,
}

impl Table {
    /// Creates an empty table described by `attributes`.
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Table {
            attributes,
            records: Vec::new(),
            normalizer: CatalogNormalizer,
        }
    }

    /// Appends a record after checking it against the catalog.
    pub fn push(&mut self, record: Vec<Value>) -> Result<()> {
        check_len("record", self.attributes.len(), record.len())?;
        for (attribute, value) in self.attributes.iter().zip(&record) {
            attribute.normalize(value)?;
        }
        self.records.push(record);
        Ok(())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The attribute catalog, one entry per column.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Every record, in insertion order.
    pub fn records(&self) -> &[Vec<Value>] {
        &self.records
    }

    /// Returns record `index`, if it exists.
    pub fn record(&self, index: usize) -> Option<&[Value]> {
        self.records.get(index).map(Vec::as_slice)
    }

    /// Returns the column index of the attribute called `name`.
    pub fn attribute_index(&self, name: &str) -> Result<usize> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| Error::UnknownAttribute(name.into()))
    }

    /// Returns the column indexes of every attribute with the given usage.
    pub fn columns_of(&self, usage: Usage) -> Vec<usize> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.usage == usage)
            .map(|(i, _)| i)
            .collect()
    }

    /// Counts the attributes with the given usage.
    pub fn count_by_usage(&self, usage: Usage) -> usize {
        self.attributes.iter().filter(|a| a.usage == usage).count()
    }

    /// Normalizes the attributes of `record` that have the given usage.
    pub fn encode(&self, record: &[Value], usage: Usage) -> Result<Vec<f64>> {
        check_len("record", self.attributes.len(), record.len())?;
        self.attributes
            .iter()
            .zip(record)
            .filter(|(a, _)| a.usage == usage)
            .map(|(a, v)| a.normalize(v))
            .collect()
    }

    /// Normalizes `record` into its `(input, output)` vectors.
    pub fn encode_record(&self, record: &[Value]) -> Result<(Vec<f64>, Vec<f64>)> {
        Ok((
            self.encode(record, Usage::Input)?,
            self.encode(record, Usage::Output)?,
        ))
    }

    /// Copies the rows at `indexes` into a new table with the same catalog.
    pub fn subset(&self, indexes: &[usize]) -> Result<Table> {
        let mut records = Vec::with_capacity(indexes.len());
        for &index in indexes {
            match self.records.get(index) {
                Some(record) => records.push(record.clone()),
                None => {
                    return Err(Error::InvalidParameter {
                        name: "indexes",
                        reason: format!("row {} out of {}", index, self.records.len()),
                    })
                }
            }
        }
        Ok(Table {
            attributes: self.attributes.clone(),
            records,
            normalizer: CatalogNormalizer,
        })
    }

    /// Converts a normalized output vector back into cell values.
    pub fn decode_outputs(&self, values: &[f64]) -> Result<Vec<Value>> {
        let outputs = self.output_attributes();
        check_len("outputs", outputs.len(), values.len())?;
        Ok(outputs.iter().zip(values).map(|(a, &x)| a.decode(x)).collect())
    }

    /// Returns the rows of `subset` whose nominal `column` equals `label`.
    pub fn split_by_value(&self, subset: &[usize], column: usize, label: &str) -> Vec<usize> {
        subset
            .iter()
            .copied()
            .filter(|&row| self.records[row][column].as_nominal() == Some(label))
            .collect()
    }
}

impl DataSource for Table {
    type Normalizer = CatalogNormalizer;

    fn len(&self) -> usize {
        Table::len(self)
    }

    fn normalized_data(&self) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let mut inputs = Vec::with_capacity(self.records.len());
        let mut outputs = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let (input, output) = self.encode_record(record)?;
            inputs.push(input);
            outputs.push(output);
        }
        Ok((inputs, outputs))
    }

    fn normalizer(&self) -> &CatalogNormalizer {
        &self.normalizer
    }

    fn output_attributes(&self) -> Vec<Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.usage == Usage::Output)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    pub(crate) fn nominal(values: &[&str]) -> Vec<Value> {
        values.iter().map(|&v| Value::nominal(v)).collect()
    }

    /// The classic play-tennis weather data.
    pub(crate) fn tennis() -> Table {
        let mut table = Table::new(vec![
            Attribute::nominal("Outlook", Usage::Input, &["Sunny", "Overcast", "Rain"]),
            Attribute::nominal("Temperature", Usage::Input, &["Hot", "Mild", "Cool"]),
            Attribute::nominal("Humidity", Usage::Input, &["High", "Normal"]),
            Attribute::nominal("Wind", Usage::Input, &["Weak", "Strong"]),
            Attribute::nominal("Play", Usage::Output, &["No", "Yes"]),
        ]);
        let rows = [
            ["Sunny", "Hot", "High", "Weak", "No"],
            ["Sunny", "Hot", "High", "Strong", "No"],
            ["Overcast", "Hot", "High", "Weak", "Yes"],
            ["Rain", "Mild", "High", "Weak", "Yes"],
            ["Rain", "Cool", "Normal", "Weak", "Yes"],
            ["Rain", "Cool", "Normal", "Strong", "No"],
            ["Overcast", "Cool", "Normal", "Strong", "Yes"],
            ["Sunny", "Mild", "High", "Weak", "No"],
            ["Sunny", "Cool", "Normal", "Weak", "Yes"],
            ["Rain", "Mild", "Normal", "Weak", "Yes"],
            ["Sunny", "Mild", "Normal", "Strong", "Yes"],
            ["Overcast", "Mild", "High", "Strong", "Yes"],
            ["Overcast", "Hot", "Normal", "Weak", "Yes"],
            ["Rain", "Mild", "High", "Strong", "No"],
        ];
        for row in &rows {
            table.push(nominal(row)).unwrap();
        }
        table
    }

    #[test]
    fn push_validates_records() {
        let mut table = tennis();
        assert!(table.push(nominal(&["Sunny", "Hot", "High", "Weak"])).is_err());
        assert_eq!(
            table
                .push(nominal(&["Snow", "Hot", "High", "Weak", "No"]))
                .unwrap_err(),
            Error::InvalidValue {
                attribute: "Outlook".into(),
                value: "Snow".into(),
            }
        );
        assert_eq!(table.len(), 14);
    }

    #[test]
    fn nominal_codes_spread_over_unit_interval() {
        let table = tennis();
        let outlook = &table.attributes()[0];
        assert_eq!(outlook.normalize(&Value::nominal("Sunny")).unwrap(), 0.0);
        assert_eq!(outlook.normalize(&Value::nominal("Overcast")).unwrap(), 0.5);
        assert_eq!(outlook.normalize(&Value::nominal("Rain")).unwrap(), 1.0);
        assert!(outlook.normalize(&Value::Numeric(0.5)).is_err());
    }

    #[test]
    fn undo_nominal_confidence() {
        let play = Attribute::nominal("Play", Usage::Output, &["No", "Yes"]);
        assert_eq!(play.undo_normalize(1.0), (1.0, "Yes".to_string()));
        let (confidence, label) = play.undo_normalize(0.2);
        assert_eq!(label, "No");
        assert_abs_diff_eq!(confidence, 0.6, epsilon = 1e-12);
        assert_eq!(play.undo_normalize(-0.3).1, "No");
        assert_eq!(play.undo_normalize(1.7).1, "Yes");
    }

    #[test]
    fn numeric_scaling() {
        let size = Attribute::numeric("size", Usage::Input, 10.0, 20.0);
        assert_abs_diff_eq!(size.normalize(&Value::Numeric(15.0)).unwrap(), 0.5);
        assert_eq!(size.decode(0.25), Value::Numeric(12.5));
        let flat = Attribute::numeric("flat", Usage::Input, 3.0, 3.0);
        assert_eq!(flat.normalize(&Value::Numeric(3.0)).unwrap(), 0.0);
    }

    #[test]
    fn normalized_data_shapes() {
        let table = tennis();
        let (inputs, outputs) = table.normalized_data().unwrap();
        assert_eq!(inputs.len(), 14);
        assert_eq!(outputs.len(), 14);
        assert!(inputs.iter().all(|x| x.len() == 4));
        assert_eq!(outputs[0], vec![0.0]);
        assert_eq!(outputs[2], vec![1.0]);
        assert_eq!(table.count_by_usage(Usage::Input), 4);
        assert_eq!(table.columns_of(Usage::Output), vec![4]);
    }

    #[test]
    fn catalog_normalizer_checks_width() {
        let table = tennis();
        let outputs = table.output_attributes();
        let labels = table.normalizer().undo_normalize(&outputs, &[0.9]).unwrap();
        assert_eq!(labels[0].1, "Yes");
        assert!(table.normalizer().undo_normalize(&outputs, &[]).is_err());
    }

    #[test]
    fn split_by_value() {
        let table = tennis();
        let all: Vec<usize> = (0..table.len()).collect();
        let outlook = table.attribute_index("Outlook").unwrap();
        let overcast = table.split_by_value(&all, outlook, "Overcast");
        assert_eq!(overcast, vec![2, 6, 11, 12]);
        assert!(table.attribute_index("Colour").is_err());
    }

    #[test]
    fn encode_record_splits_by_usage() {
        let table = tennis();
        let (input, output) = table.encode_record(&table.records()[2]).unwrap();
        assert_eq!(input, vec![0.5, 0.0, 0.0, 0.0]);
        assert_eq!(output, vec![1.0]);
        assert!(table.encode_record(&nominal(&["Sunny"])).is_err());
    }

    #[test]
    fn subset_keeps_catalog() {
        let table = tennis();
        let rows = table.subset(&[2, 6, 11, 12]).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.attributes(), table.attributes());
        assert_eq!(rows.record(1), table.record(6));
        assert!(rows.records().iter().all(|r| r[0] == Value::nominal("Overcast")));
        assert!(table.subset(&[14]).is_err());
        assert!(table.subset(&[]).unwrap().is_empty());
    }
}
