//! The [ID3](https://en.wikipedia.org/wiki/ID3_algorithm) decision tree
//! learner for nominal data.

use std::collections::BTreeMap;
use std::fmt;

use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::{Table, Usage, Value};
use crate::error::{Error, Result};

/// A node of a learned decision tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DecisionNode {
    /// Predicts `label` for every record that reaches it.
    Leaf { label: String },
    /// Routes a record by its value of `attribute`.
    Split {
        attribute: String,
        column: usize,
        children: BTreeMap<String, DecisionNode>,
        /// Predicted for values no child was built for.
        fallback: String,
    },
}

impl DecisionNode {
    fn leaf(label: String) -> Self {
        DecisionNode::Leaf { label }
    }

    /// Walks the tree with `record` and returns the predicted class label.
    pub fn classify(&self, record: &[Value]) -> Result<String> {
        match self {
            DecisionNode::Leaf { label } => Ok(label.clone()),
            DecisionNode::Split {
                attribute,
                column,
                children,
                fallback,
            } => {
                let value = record
                    .get(*column)
                    .ok_or_else(|| Error::mismatch("record", column + 1, record.len()))?;
                let label = value
                    .as_nominal()
                    .ok_or_else(|| Error::NotNominal(attribute.clone()))?;
                match children.get(label) {
                    Some(child) => child.classify(record),
                    None => Ok(fallback.clone()),
                }
            }
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            DecisionNode::Leaf { .. } => 1,
            DecisionNode::Split { children, .. } => {
                1 + children.values().map(DecisionNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            DecisionNode::Leaf { .. } => 1,
            DecisionNode::Split { children, .. } => {
                children.values().map(DecisionNode::leaf_count).sum()
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            DecisionNode::Leaf { label } => {
                writeln!(f, "{:indent$}{}", "", label, indent = 4 * depth)
            }
            DecisionNode::Split {
                attribute,
                children,
                ..
            } => {
                for (value, child) in children {
                    write!(f, "{:indent$}{} = {}", "", attribute, value, indent = 4 * depth)?;
                    match child {
                        DecisionNode::Leaf { label } => writeln!(f, ": {}", label)?,
                        DecisionNode::Split { .. } => {
                            writeln!(f)?;
                            child.fmt_indented(f, depth + 1)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Prints one line per branch, indenting each split one level deeper than
/// its parent. Branches ending in a leaf show the predicted label inline.
impl fmt::Display for DecisionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Builds decision trees predicting one nominal class attribute.
#[derive(Clone, Debug)]
pub struct Id3 {
    class_name: String,
}

impl Id3 {
    /// Targets the attribute called `class_name`.
    pub fn new(class_name: &str) -> Self {
        Id3 {
            class_name: class_name.into(),
        }
    }

    /// Greedily builds a tree over the nominal input attributes of `table`.
    pub fn build(&self, table: &Table) -> Result<DecisionNode> {
        if table.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let class = table.attribute_index(&self.class_name)?;
        let classes = nominal_levels(table, class)?;
        let attributes = table.columns_of(Usage::Input);
        for &column in &attributes {
            nominal_levels(table, column)?;
        }
        let builder = Builder {
            table,
            class,
            classes,
        };
        let all: Vec<usize> = (0..table.len()).collect();
        Ok(builder.build(&all, &attributes))
    }
}

fn nominal_levels(table: &Table, column: usize) -> Result<&[String]> {
    let attribute = &table.attributes()[column];
    attribute
        .levels()
        .ok_or_else(|| Error::NotNominal(attribute.name.clone()))
}

struct Builder<'a> {
    table: &'a Table,
    class: usize,
    classes: &'a [String],
}

impl<'a> Builder<'a> {
    fn build(&self, subset: &[usize], attributes: &[usize]) -> DecisionNode {
        for label in self.classes {
            if subset.iter().all(|&row| self.class_of(row) == Some(label.as_str())) {
                return DecisionNode::leaf(label.clone());
            }
        }
        let common = self.most_common_class(subset);
        if attributes.is_empty() {
            return DecisionNode::leaf(common);
        }

        let mut best = attributes[0];
        let mut best_entropy = f64::INFINITY;
        for &column in attributes {
            let entropy = self.split_entropy(column, subset);
            debug!(attribute = %self.table.attributes()[column].name, entropy, "split candidate");
            if entropy < best_entropy {
                best = column;
                best_entropy = entropy;
            }
        }
        let attribute = &self.table.attributes()[best];
        info!(attribute = %attribute.name, rows = subset.len(), "selected split");

        let remaining: Vec<usize> = attributes.iter().copied().filter(|&c| c != best).collect();
        let mut children = BTreeMap::new();
        for level in attribute.levels().unwrap_or_default() {
            let rows = self.table.split_by_value(subset, best, level);
            let child = if rows.is_empty() {
                DecisionNode::leaf(common.clone())
            } else {
                self.build(&rows, &remaining)
            };
            children.insert(level.clone(), child);
        }
        DecisionNode::Split {
            attribute: attribute.name.clone(),
            column: best,
            children,
            fallback: common,
        }
    }

    fn class_of(&self, row: usize) -> Option<&str> {
        self.table.records()[row][self.class].as_nominal()
    }

    /// Shannon entropy of the class distribution over `subset`.
    fn entropy(&self, subset: &[usize]) -> f64 {
        let n = subset.len() as f64;
        self.classes
            .iter()
            .map(|label| self.table.split_by_value(subset, self.class, label).len())
            .filter(|&count| count > 0)
            .map(|count| {
                let p = count as f64 / n;
                -p * p.log2()
            })
            .sum()
    }

    /// Class entropy left after splitting `subset` on `column`, weighted by
    /// the share of rows taking each value.
    fn split_entropy(&self, column: usize, subset: &[usize]) -> f64 {
        let n = subset.len() as f64;
        self.table.attributes()[column]
            .levels()
            .unwrap_or_default()
            .iter()
            .map(|level| self.table.split_by_value(subset, column, level))
            .filter(|rows| !rows.is_empty())
            .map(|rows| rows.len() as f64 / n * self.entropy(&rows))
            .sum()
    }

    /// The class label held by most rows of `subset`, first in catalog order
    /// on ties.
    fn most_common_class(&self, subset: &[usize]) -> String {
        let mut common = &self.classes[0];
        let mut max = 0;
        for label in self.classes {
            let count = subset
                .iter()
                .filter(|&&row| self.class_of(row) == Some(label.as_str()))
                .count();
            if count > max {
                max = count;
                common = label;
            }
        }
        common.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{nominal, tennis};
    use crate::dataset::Attribute;

    #[test]
    fn tennis_tree() {
        let table = tennis();
        let tree = Id3::new("Play").build(&table).unwrap();
        match &tree {
            DecisionNode::Split {
                attribute,
                children,
                ..
            } => {
                assert_eq!(attribute, "Outlook");
                assert_eq!(children["Overcast"], DecisionNode::leaf("Yes".into()));
            }
            DecisionNode::Leaf { .. } => panic!("expected a split at the root"),
        }
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_count(), 5);
        for record in table.records() {
            assert_eq!(tree.classify(record).unwrap(), record[4].to_string());
        }
    }

    #[test]
    fn renders_one_line_per_branch() {
        let tree = Id3::new("Play").build(&tennis()).unwrap();
        let expected = "\
Outlook = Overcast: Yes
Outlook = Rain
    Wind = Strong: No
    Wind = Weak: Yes
Outlook = Sunny
    Humidity = High: No
    Humidity = Normal: Yes
";
        assert_eq!(tree.to_string(), expected);
        assert_eq!(DecisionNode::leaf("Yes".into()).to_string(), "Yes\n");
    }

    #[test]
    fn unseen_value_uses_fallback() {
        let mut table = Table::new(vec![
            Attribute::nominal("colour", Usage::Input, &["red", "green", "blue"]),
            Attribute::nominal("ripe", Usage::Output, &["no", "yes"]),
        ]);
        for row in &[["red", "yes"], ["red", "yes"], ["green", "no"]] {
            table.push(nominal(row)).unwrap();
        }
        let tree = Id3::new("ripe").build(&table).unwrap();
        // no blue rows, so the branch predicts the majority class
        assert_eq!(tree.classify(&nominal(&["blue", "no"])).unwrap(), "yes");
        assert_eq!(tree.classify(&nominal(&["green", "yes"])).unwrap(), "no");
    }

    #[test]
    fn pure_data_is_a_leaf() {
        let mut table = Table::new(vec![
            Attribute::nominal("a", Usage::Input, &["x", "y"]),
            Attribute::nominal("c", Usage::Output, &["p", "q"]),
        ]);
        table.push(nominal(&["x", "q"])).unwrap();
        table.push(nominal(&["y", "q"])).unwrap();
        let tree = Id3::new("c").build(&table).unwrap();
        assert_eq!(tree, DecisionNode::leaf("q".into()));
    }

    #[test]
    fn conflicting_rows_take_majority() {
        let mut table = Table::new(vec![
            Attribute::nominal("a", Usage::Input, &["x"]),
            Attribute::nominal("c", Usage::Output, &["p", "q"]),
        ]);
        for row in &[["x", "p"], ["x", "q"], ["x", "q"]] {
            table.push(nominal(row)).unwrap();
        }
        let tree = Id3::new("c").build(&table).unwrap();
        assert_eq!(tree.classify(&nominal(&["x", "p"])).unwrap(), "q");
    }

    #[test]
    fn rejects_bad_tables() {
        let empty = Table::new(tennis().attributes().to_vec());
        assert_eq!(Id3::new("Play").build(&empty).unwrap_err(), Error::EmptyDataset);
        assert!(Id3::new("Colour").build(&tennis()).is_err());

        let mut numeric = Table::new(vec![
            Attribute::numeric("size", Usage::Input, 0.0, 1.0),
            Attribute::nominal("c", Usage::Output, &["p"]),
        ]);
        numeric.push(vec![Value::Numeric(0.5), Value::nominal("p")]).unwrap();
        assert_eq!(
            Id3::new("c").build(&numeric).unwrap_err(),
            Error::NotNominal("size".into())
        );
    }
}
