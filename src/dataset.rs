use crate::error::DatasetError;
use crate::parser;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Label text meaning "this instance is unlabeled"
pub const NULL_LABEL: &str = "null";

/// A location in the x-y plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Borrowed view of one instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance<'a> {
    pub name: &'a str,
    pub location: Point,
    pub label: &'a str,
    pub original_label: &'a str,
}

/// Axis-aligned bounding box of a dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Tick unit for an axis spanning `min..=max`: a tenth of the range,
    /// or 1.0 when every value is the same.
    pub fn tick_unit(min: f64, max: f64) -> f64 {
        let range = max - min;
        if range > 0.0 {
            range / 10.0
        } else {
            1.0
        }
    }

    /// The box widened by one tick unit on every side
    pub fn padded(&self) -> Bounds {
        let x_tick = Self::tick_unit(self.min_x, self.max_x);
        let y_tick = Self::tick_unit(self.min_y, self.max_y);
        Bounds {
            min_x: self.min_x - x_tick,
            max_x: self.max_x + x_tick,
            min_y: self.min_y - y_tick,
            max_y: self.max_y + y_tick,
        }
    }
}

/// Sorted unique coordinate values, valid until the point set changes
#[derive(Debug, Clone, PartialEq)]
struct Summary {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Summary {
    fn from_points(points: &[Point]) -> Self {
        let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let mut ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        for values in [&mut xs, &mut ys] {
            values.sort_by(f64::total_cmp);
            values.dedup();
        }
        Self { xs, ys }
    }
}

/// Named 2-D instances with a working label and an original label each.
///
/// Names, locations and both label columns are stored side by side in
/// declaration order, so every mapping shares the same key set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    index: HashMap<String, usize>,
    locations: Vec<Point>,
    labels: Vec<String>,
    original_labels: Vec<String>,
    summary: Option<Summary>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `.tsd` text into a dataset
    pub fn from_text(text: &str) -> Result<Self, DatasetError> {
        Ok(parser::parse(text)?)
    }

    /// Read and parse a `.tsd` file
    pub fn from_tsd_file<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    /// Write the dataset, with its original labels, as a `.tsd` file
    pub fn save_tsd<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        fs::write(path, self.to_tsd())?;
        Ok(())
    }

    /// Serialize to the `.tsd` text format using the original labels
    pub fn to_tsd(&self) -> String {
        let mut out = String::new();
        for instance in self.instances() {
            let _ = writeln!(
                out,
                "{}\t{}\t{},{}",
                instance.name, instance.original_label, instance.location.x, instance.location.y
            );
        }
        out
    }

    /// Add an instance. Returns `false` and leaves the dataset untouched if
    /// the name is already present.
    pub(crate) fn insert(&mut self, name: &str, label: &str, location: Point) -> bool {
        if self.contains(name) {
            return false;
        }
        self.index.insert(name.to_string(), self.names.len());
        self.names.push(name.to_string());
        self.locations.push(location);
        self.labels.push(label.to_string());
        self.original_labels.push(label.to_string());
        self.summary = None;
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Instance names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// All instances in declaration order
    pub fn instances(&self) -> impl Iterator<Item = Instance<'_>> {
        (0..self.len()).map(move |i| self.instance_at(i))
    }

    fn instance_at(&self, i: usize) -> Instance<'_> {
        Instance {
            name: &self.names[i],
            location: self.locations[i],
            label: &self.labels[i],
            original_label: &self.original_labels[i],
        }
    }

    pub fn instance(&self, name: &str) -> Option<Instance<'_>> {
        self.index.get(name).map(|&i| self.instance_at(i))
    }

    pub fn location(&self, name: &str) -> Option<Point> {
        self.index.get(name).map(|&i| self.locations[i])
    }

    /// Current working label
    pub fn label(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.labels[i].as_str())
    }

    /// Label as parsed
    pub fn original_label(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.original_labels[i].as_str())
    }

    /// Locations in declaration order
    pub fn locations(&self) -> &[Point] {
        &self.locations
    }

    /// Working labels in declaration order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Replace the working label of `name`
    pub fn update_label(&mut self, name: &str, label: &str) -> Result<(), DatasetError> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| DatasetError::UnknownInstance(name.to_string()))?;
        self.labels[i] = label.to_string();
        Ok(())
    }

    /// Replace the working label at declaration position `i`
    pub(crate) fn set_label_at(&mut self, i: usize, label: String) {
        self.labels[i] = label;
    }

    /// Restore every working label to its original value
    pub fn reset_labels(&mut self) {
        self.labels.clone_from(&self.original_labels);
    }

    /// Distinct original labels in first-seen order, without the null label
    pub fn distinct_labels(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for label in &self.original_labels {
            if label != NULL_LABEL && !seen.contains(&label.as_str()) {
                seen.push(label.as_str());
            }
        }
        seen
    }

    /// Recompute the sorted coordinate summary used by [`Dataset::bounds`]
    pub fn refresh_summary(&mut self) {
        self.summary = Some(Summary::from_points(&self.locations));
    }

    /// Sorted unique x values, if the summary is current
    pub fn sorted_xs(&self) -> Option<&[f64]> {
        self.summary.as_ref().map(|s| s.xs.as_slice())
    }

    /// Sorted unique y values, if the summary is current
    pub fn sorted_ys(&self) -> Option<&[f64]> {
        self.summary.as_ref().map(|s| s.ys.as_slice())
    }

    /// Bounding box of all locations.
    ///
    /// Returns `None` when the dataset is empty or the summary is stale;
    /// call [`Dataset::refresh_summary`] after the point set changes.
    pub fn bounds(&self) -> Option<Bounds> {
        let summary = self.summary.as_ref()?;
        Some(Bounds {
            min_x: *summary.xs.first()?,
            max_x: *summary.xs.last()?,
            min_y: *summary.ys.first()?,
            max_y: *summary.ys.last()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new();
        assert!(dataset.insert("@a", "L1", Point::new(1.0, 4.0)));
        assert!(dataset.insert("@b", "null", Point::new(3.0, 2.0)));
        assert!(dataset.insert("@c", "L2", Point::new(1.0, 6.0)));
        dataset
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut dataset = sample();
        assert!(!dataset.insert("@a", "L9", Point::new(9.0, 9.0)));
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.location("@a"), Some(Point::new(1.0, 4.0)));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let dataset = sample();
        let names: Vec<&str> = dataset.names().collect();
        assert_eq!(names, vec!["@a", "@b", "@c"]);
    }

    #[test]
    fn test_update_label_keeps_original() {
        let mut dataset = sample();
        dataset.update_label("@a", "0").unwrap();
        assert_eq!(dataset.label("@a"), Some("0"));
        assert_eq!(dataset.original_label("@a"), Some("L1"));

        dataset.reset_labels();
        assert_eq!(dataset.label("@a"), Some("L1"));
    }

    #[test]
    fn test_update_unknown_label_fails() {
        let mut dataset = sample();
        let result = dataset.update_label("@zzz", "0");
        assert!(matches!(result, Err(DatasetError::UnknownInstance(name)) if name == "@zzz"));
    }

    #[test]
    fn test_distinct_labels_skip_null() {
        let dataset = sample();
        assert_eq!(dataset.distinct_labels(), vec!["L1", "L2"]);
    }

    #[test]
    fn test_bounds_require_refresh() {
        let mut dataset = sample();
        assert!(dataset.bounds().is_none());

        dataset.refresh_summary();
        let bounds = dataset.bounds().unwrap();
        assert_relative_eq!(bounds.min_x, 1.0);
        assert_relative_eq!(bounds.max_x, 3.0);
        assert_relative_eq!(bounds.min_y, 2.0);
        assert_relative_eq!(bounds.max_y, 6.0);
        assert_eq!(dataset.sorted_xs().unwrap(), &[1.0, 3.0]);

        // Adding a point invalidates the summary
        dataset.insert("@d", "L1", Point::new(-5.0, 0.0));
        assert!(dataset.bounds().is_none());
        dataset.refresh_summary();
        assert_relative_eq!(dataset.bounds().unwrap().min_x, -5.0);
    }

    #[test]
    fn test_empty_dataset_has_no_bounds() {
        let mut dataset = Dataset::new();
        dataset.refresh_summary();
        assert!(dataset.bounds().is_none());
    }

    #[test]
    fn test_padded_bounds() {
        let bounds = Bounds {
            min_x: 0.0,
            max_x: 10.0,
            min_y: 5.0,
            max_y: 5.0,
        };
        let padded = bounds.padded();
        assert_relative_eq!(padded.min_x, -1.0);
        assert_relative_eq!(padded.max_x, 11.0);
        assert_relative_eq!(padded.min_y, 4.0);
        assert_relative_eq!(padded.max_y, 6.0);
    }

    #[test]
    fn test_to_tsd_uses_original_labels() {
        let mut dataset = sample();
        dataset.update_label("@a", "1").unwrap();
        let text = dataset.to_tsd();
        assert_eq!(text, "@a\tL1\t1,4\n@b\tnull\t3,2\n@c\tL2\t1,6\n");
    }
}
