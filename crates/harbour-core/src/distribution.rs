//! Distribution of due containers over freshly built transporters.
//!
//! [`distribute`] turns one tick's worth of due containers into loaded
//! [`Transporter`]s:
//!
//! 1. Split the batch by [`TransportCategory`]; empty categories are skipped.
//! 2. Within a category, bucket containers by exact spawn coordinate,
//!    preserving batch order inside each bucket.
//! 3. Build as many transporters as the largest bucket holds containers,
//!    each with a grid of `(max x + 1) x (max y + 1)` cells.
//! 4. Fill transporters one at a time: each takes the front container of
//!    every non-empty bucket, placed at that bucket's `(x, y)` cell.
//!
//! Buckets are visited in ascending `(x, y, z)` order, so which transporter
//! receives which container is deterministic. Categories are processed
//! road, rail, inland waterway, sea.
//!
//! Every input container ends up on exactly one transporter, no transporter
//! is empty, and each receives at most one container per coordinate.

use std::collections::{BTreeMap, VecDeque};

use harbour_types::{Container, SpawnPoint, TransportCategory};
use tracing::{debug, error};

use crate::transporter::Transporter;

/// Grid dimensions derived from one category's containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    /// Rows: highest x coordinate plus one.
    pub limit_x: u64,
    /// Columns: highest y coordinate plus one.
    pub limit_y: u64,
    /// Stacking levels: highest z coordinate plus one.
    pub limit_z: u64,
}

impl GridBounds {
    /// Smallest bounds containing every coordinate; at least `1x1x1`.
    ///
    /// Widening to `u64` first means even `u32::MAX` lies inside.
    pub fn covering(points: impl IntoIterator<Item = SpawnPoint>) -> Self {
        points.into_iter().fold(
            Self {
                limit_x: 1,
                limit_y: 1,
                limit_z: 1,
            },
            |bounds, p| Self {
                limit_x: bounds.limit_x.max(u64::from(p.x).saturating_add(1)),
                limit_y: bounds.limit_y.max(u64::from(p.y).saturating_add(1)),
                limit_z: bounds.limit_z.max(u64::from(p.z).saturating_add(1)),
            },
        )
    }

    /// Container limit for a transporter with these bounds.
    ///
    /// A transporter receives at most one container per distinct
    /// coordinate, and every coordinate lies inside the bounds, so this
    /// limit is never reached by [`distribute`].
    pub fn capacity(self) -> usize {
        let cells = self
            .limit_x
            .saturating_mul(self.limit_y)
            .saturating_mul(self.limit_z);
        usize::try_from(cells).unwrap_or(usize::MAX)
    }
}

/// Containers of one category grouped by spawn coordinate.
type Buckets = BTreeMap<SpawnPoint, VecDeque<Container>>;

/// Distribute due containers over new transporters.
///
/// An empty batch returns an empty list without doing any work.
pub fn distribute(batch: Vec<Container>) -> Vec<Transporter> {
    if batch.is_empty() {
        return Vec::new();
    }

    let mut by_category: [Vec<Container>; 4] = Default::default();
    for container in batch {
        if let Some(group) = by_category.get_mut(container.category().index()) {
            group.push(container);
        }
    }

    TransportCategory::ALL
        .into_iter()
        .zip(by_category)
        .filter(|(_, containers)| !containers.is_empty())
        .flat_map(|(category, containers)| distribute_category(category, containers))
        .collect()
}

/// Distribute the containers of a single category.
fn distribute_category(category: TransportCategory, containers: Vec<Container>) -> Vec<Transporter> {
    let container_count = containers.len();
    let mut buckets = bucket_by_spawn(containers);

    let transporter_count = buckets.values().map(VecDeque::len).max().unwrap_or(0);
    let bounds = GridBounds::covering(buckets.keys().copied());

    debug!(
        %category,
        containers = container_count,
        buckets = buckets.len(),
        transporters = transporter_count,
        limit_x = bounds.limit_x,
        limit_y = bounds.limit_y,
        "Distributing category"
    );

    let mut transporters = Vec::with_capacity(transporter_count);
    for _ in 0..transporter_count {
        let mut transporter =
            Transporter::new(category, bounds.limit_x, bounds.limit_y, bounds.capacity());
        fill_round(&mut transporter, &mut buckets);

        if transporter.is_empty() {
            continue;
        }
        transporters.push(transporter);
    }

    if !buckets.is_empty() {
        let stranded: usize = buckets.values().map(VecDeque::len).sum();
        error!(%category, stranded, "Containers left undistributed after final round");
    }

    transporters
}

/// Group containers by exact spawn coordinate, keeping batch order.
fn bucket_by_spawn(containers: Vec<Container>) -> Buckets {
    let mut buckets = Buckets::new();
    for container in containers {
        buckets.entry(container.spawn()).or_default().push_back(container);
    }
    buckets
}

/// Place the front container of every bucket onto `transporter`, then drop
/// buckets that ran dry.
///
/// A container the transporter refuses goes back to the front of its bucket.
fn fill_round(transporter: &mut Transporter, buckets: &mut Buckets) {
    for (spawn, bucket) in buckets.iter_mut() {
        let Some(container) = bucket.pop_front() else {
            continue;
        };
        if let Err(e) = transporter.put_container(spawn.grid_point(), container) {
            error!(
                transporter_id = %transporter.id(),
                %spawn,
                error = %e,
                "Container placement failed, returned to its bucket"
            );
            if let Some(container) = e.into_container() {
                bucket.push_front(container);
            }
        }
    }
    buckets.retain(|_, bucket| !bucket.is_empty());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use harbour_types::{ContainerId, GridPoint};

    use super::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2004, 12, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn container(id: &str, category: TransportCategory, x: u32, y: u32, z: u32) -> Container {
        Container::new(
            ContainerId::from(id),
            base() + TimeDelta::minutes(1),
            category,
            SpawnPoint::new(x, y, z),
        )
    }

    fn ids(transporter: &Transporter) -> Vec<String> {
        transporter.containers().map(|c| c.id().to_string()).collect()
    }

    #[test]
    fn empty_batch_yields_nothing() {
        assert!(distribute(Vec::new()).is_empty());
    }

    #[test]
    fn sea_scenario_two_transporters() {
        let batch = vec![
            container("s1", TransportCategory::Sea, 0, 0, 0),
            container("s2", TransportCategory::Sea, 0, 0, 0),
            container("s3", TransportCategory::Sea, 1, 0, 1),
        ];

        let transporters = distribute(batch);

        assert_eq!(transporters.len(), 2);
        let first = transporters.first().unwrap();
        let second = transporters.get(1).unwrap();

        assert_eq!(first.category(), TransportCategory::Sea);
        assert_eq!((first.limit_x(), first.limit_y()), (2, 1));
        assert_eq!((second.limit_x(), second.limit_y()), (2, 1));

        assert_eq!(ids(first), vec!["s1", "s3"]);
        assert_eq!(first.height_at(GridPoint::new(0, 0)).unwrap(), 1);
        assert_eq!(first.height_at(GridPoint::new(1, 0)).unwrap(), 1);
        assert_eq!(ids(second), vec!["s2"]);
    }

    #[test]
    fn single_coordinate_gives_one_transporter_per_container() {
        let batch: Vec<Container> = (0..5)
            .map(|i| container(&format!("r{i}"), TransportCategory::Rail, 2, 3, 0))
            .collect();

        let transporters = distribute(batch);

        assert_eq!(transporters.len(), 5);
        for (i, transporter) in transporters.iter().enumerate() {
            assert_eq!(transporter.len(), 1);
            assert_eq!(ids(transporter), vec![format!("r{i}")]);
            assert_eq!(transporter.height_at(GridPoint::new(2, 3)).unwrap(), 1);
        }
    }

    #[test]
    fn transporter_count_is_largest_bucket() {
        // Four distinct coordinates, busiest holds three containers.
        let batch = vec![
            container("a1", TransportCategory::Road, 0, 0, 0),
            container("b1", TransportCategory::Road, 1, 0, 0),
            container("b2", TransportCategory::Road, 1, 0, 0),
            container("b3", TransportCategory::Road, 1, 0, 0),
            container("c1", TransportCategory::Road, 0, 1, 0),
            container("d1", TransportCategory::Road, 4, 2, 1),
            container("d2", TransportCategory::Road, 4, 2, 1),
        ];

        let transporters = distribute(batch);

        assert_eq!(transporters.len(), 3);
        let sizes: Vec<usize> = transporters.iter().map(Transporter::len).collect();
        assert_eq!(sizes, vec![4, 2, 1]);
        for transporter in &transporters {
            assert_eq!((transporter.limit_x(), transporter.limit_y()), (5, 3));
        }
    }

    #[test]
    fn every_container_placed_exactly_once() {
        let mut batch = Vec::new();
        let mut expected = BTreeSet::new();
        for i in 0..40_u32 {
            let category = TransportCategory::ALL
                .get(usize::try_from(i % 4).unwrap())
                .copied()
                .unwrap();
            let id = format!("c{i}");
            expected.insert(id.clone());
            batch.push(container(&id, category, i % 3, i % 5, i % 2));
        }

        let transporters = distribute(batch);

        let mut seen = BTreeSet::new();
        for transporter in &transporters {
            assert!(!transporter.is_empty());
            assert!(transporter.len() <= transporter.capacity());
            for c in transporter.containers() {
                assert_eq!(c.category(), transporter.category());
                assert!(seen.insert(c.id().to_string()), "duplicate {}", c.id());
            }
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn categories_are_emitted_in_processing_order() {
        let batch = vec![
            container("sea", TransportCategory::Sea, 0, 0, 0),
            container("inland", TransportCategory::InlandWaterway, 0, 0, 0),
            container("road", TransportCategory::Road, 0, 0, 0),
            container("rail", TransportCategory::Rail, 0, 0, 0),
        ];

        let categories: Vec<TransportCategory> =
            distribute(batch).iter().map(Transporter::category).collect();

        assert_eq!(categories, TransportCategory::ALL.to_vec());
    }

    #[test]
    fn categories_are_bounded_independently() {
        let batch = vec![
            container("road", TransportCategory::Road, 0, 0, 0),
            container("sea", TransportCategory::Sea, 7, 9, 3),
        ];

        let transporters = distribute(batch);

        let road = transporters.first().unwrap();
        let sea = transporters.get(1).unwrap();
        assert_eq!((road.limit_x(), road.limit_y()), (1, 1));
        assert_eq!((sea.limit_x(), sea.limit_y()), (8, 10));
    }

    #[test]
    fn same_cell_different_level_stacks_on_one_transporter() {
        let batch = vec![
            container("low", TransportCategory::InlandWaterway, 1, 1, 0),
            container("high", TransportCategory::InlandWaterway, 1, 1, 1),
        ];

        let transporters = distribute(batch);

        assert_eq!(transporters.len(), 1);
        let only = transporters.first().unwrap();
        assert_eq!(only.height_at(GridPoint::new(1, 1)).unwrap(), 2);
        assert_eq!(ids(only), vec!["low", "high"]);
        assert!(only.len() <= only.capacity());
    }

    #[test]
    fn grid_bounds_cover_points() {
        let bounds = GridBounds::covering([SpawnPoint::new(2, 0, 5), SpawnPoint::new(0, 4, 1)]);
        assert_eq!(
            bounds,
            GridBounds {
                limit_x: 3,
                limit_y: 5,
                limit_z: 6,
            }
        );
        assert_eq!(bounds.capacity(), 90);
        assert_eq!(GridBounds::covering(Vec::<SpawnPoint>::new()).capacity(), 1);
    }

    #[test]
    fn extreme_coordinates_are_placed() {
        let batch = vec![
            container("corner", TransportCategory::Road, u32::MAX, u32::MAX, u32::MAX),
            container("origin", TransportCategory::Road, 0, 0, 0),
        ];

        let transporters = distribute(batch);

        assert_eq!(transporters.len(), 1);
        let transporter = transporters.first().unwrap();
        assert_eq!(ids(transporter), vec!["origin", "corner"]);
        assert_eq!(
            transporter.height_at(GridPoint::new(u32::MAX, u32::MAX)).unwrap(),
            1
        );
    }
}
