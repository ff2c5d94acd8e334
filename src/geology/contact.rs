use std::collections::BTreeSet;

use crate::math::Point3;

use super::Borehole;

/// Contact points of one stratigraphic boundary, in borehole order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPointSet {
    /// Boundary name, e.g. `A->{G,S}`.
    pub boundary: String,
    pub points: Vec<Point3>,
}

impl ContactPointSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends explicit constraint points.
    pub fn extend(&mut self, points: impl IntoIterator<Item = Point3>) {
        self.points.extend(points);
    }
}

/// Finds where a unit rests directly on any unit of a set.
///
/// For each borehole the deepest interval of `above` is used; if the
/// interval right below it belongs to `below`, the base of the `above`
/// interval is a contact point.
#[derive(Debug, Clone)]
pub struct ExtractContacts {
    above: String,
    below: BTreeSet<String>,
}

impl ExtractContacts {
    /// Creates a new `ExtractContacts` operation.
    #[must_use]
    pub fn new<S: Into<String>>(above: impl Into<String>, below: impl IntoIterator<Item = S>) -> Self {
        Self {
            above: above.into(),
            below: below.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the boundary, `above->{below,...}`.
    #[must_use]
    pub fn boundary(&self) -> String {
        let below: Vec<&str> = self.below.iter().map(String::as_str).collect();
        format!("{}->{{{}}}", self.above, below.join(","))
    }

    /// Executes the extraction. Boreholes without the contact are skipped.
    #[must_use]
    pub fn execute(&self, boreholes: &[Borehole]) -> ContactPointSet {
        let points = boreholes
            .iter()
            .filter_map(|bh| {
                let k = bh.last_index_of(&self.above)?;
                let next = bh.layers.get(k + 1)?;
                self.below
                    .contains(&next.unit)
                    .then(|| Point3::new(bh.x, bh.y, bh.top - bh.layers[k].bottom_depth))
            })
            .collect();
        ContactPointSet {
            boundary: self.boundary(),
            points,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn boreholes() -> Vec<Borehole> {
        vec![
            Borehole::new("bh01", 0.0, 0.0, 5.0, [("A", 1.0), ("G", 2.0), ("S", 7.0)]).unwrap(),
            Borehole::new("bh02", 10.0, 0.0, 3.0, [("A", 1.0), ("G", 3.0), ("S", 7.0)]).unwrap(),
        ]
    }

    #[test]
    fn top_contact() {
        let set = ExtractContacts::new("A", ["G", "S"]).execute(&boreholes());
        assert_eq!(set.points, vec![Point3::new(0.0, 0.0, 4.0), Point3::new(10.0, 0.0, 2.0)]);
        assert_eq!(set.boundary, "A->{G,S}");
    }

    #[test]
    fn inner_contact() {
        let set = ExtractContacts::new("G", ["S"]).execute(&boreholes());
        assert_eq!(set.points, vec![Point3::new(0.0, 0.0, 3.0), Point3::new(10.0, 0.0, 0.0)]);
    }

    #[test]
    fn deepest_occurrence_wins() {
        let bh = Borehole::new(
            "bh03",
            1.0,
            2.0,
            10.0,
            [("G", 1.0), ("S", 2.0), ("G", 4.0), ("S", 6.0)],
        )
        .unwrap();
        let set = ExtractContacts::new("G", ["S"]).execute(&[bh]);
        assert_eq!(set.points, vec![Point3::new(1.0, 2.0, 6.0)]);
    }

    #[test]
    fn skips_missing_and_bottom_units() {
        let bhs = vec![
            Borehole::new("only_s", 0.0, 0.0, 5.0, [("S", 3.0)]).unwrap(),
            Borehole::new("a_last", 1.0, 0.0, 5.0, [("G", 1.0), ("A", 3.0)]).unwrap(),
            Borehole::new("a_on_x", 2.0, 0.0, 5.0, [("A", 1.0), ("X", 3.0)]).unwrap(),
        ];
        let set = ExtractContacts::new("A", ["G", "S"]).execute(&bhs);
        assert!(set.is_empty());
    }
}
