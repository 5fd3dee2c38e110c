//! Commerce marker clustering and the opacity mask used while a route is
//! displayed.
//!
//! Clustering is greedy in screen space: markers are projected at the
//! current zoom, indexed in an R-tree, and every unclaimed marker absorbs the
//! unclaimed neighbours within `radius_px`. Past `disable_at_zoom` every
//! marker is drawn on its own. Start points and delivery zones are overlays
//! and never cluster.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use shopway_core::{Bounds, Commerce, DeliveryZone, Position, StartPoint};

use crate::map::projection::{project, unproject};
use crate::map::PolygonView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Commerce,
    StartPoint,
    Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerKey {
    pub kind: MarkerKind,
    pub id: i64,
}

/// One drawable item on the marker layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerView {
    Single {
        key: MarkerKey,
        position: Position,
        opacity: f64,
    },
    /// Several commerces coalesced into one interactive point. `index`
    /// identifies it for [`ClusterManager::cluster_bounds`] until the next
    /// layout.
    Cluster {
        index: usize,
        center: Position,
        count: usize,
        bounds: Bounds,
    },
}

impl MarkerView {
    #[must_use]
    pub fn key(&self) -> Option<MarkerKey> {
        match self {
            MarkerView::Single { key, .. } => Some(*key),
            MarkerView::Cluster { .. } => None,
        }
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        match self {
            MarkerView::Single { opacity, .. } => *opacity,
            MarkerView::Cluster { .. } => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    pub radius_px: f64,
    pub disable_at_zoom: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: 80.0,
            disable_at_zoom: 17.0,
        }
    }
}

/// Ids that stay visible while a route is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveIds {
    pub commerce: Option<i64>,
    pub start_point: Option<i64>,
    pub zone: Option<i64>,
}

impl ActiveIds {
    fn allows(&self, key: MarkerKey) -> bool {
        let active = match key.kind {
            MarkerKind::Commerce => self.commerce,
            MarkerKind::StartPoint => self.start_point,
            MarkerKind::Zone => self.zone,
        };
        active == Some(key.id)
    }
}

#[derive(Debug, Clone)]
struct Marker {
    key: MarkerKey,
    position: Position,
}

#[derive(Debug, Clone)]
struct ZoneOutline {
    zone_id: i64,
    ring: Vec<Position>,
}

/// R-tree node: a commerce marker in pixel space.
#[derive(Debug, Clone)]
struct ProjectedMarker {
    slot: usize,
    point: [f64; 2],
}

impl RTreeObject for ProjectedMarker {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for ProjectedMarker {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClusterManager {
    config: ClusterConfig,
    commerces: Vec<Marker>,
    overlays: Vec<Marker>,
    outlines: Vec<ZoneOutline>,
    mask: Option<ActiveIds>,
    cluster_bounds: Vec<Bounds>,
}

impl ClusterManager {
    #[must_use]
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replaces the commerce markers. Commerces without coordinates are
    /// skipped. An active mask stays in force. Returns the marker count.
    pub fn rebuild<'a, I>(&mut self, commerces: I) -> usize
    where
        I: IntoIterator<Item = &'a Commerce>,
    {
        self.commerces.clear();
        self.cluster_bounds.clear();
        let mut skipped = 0_usize;
        for commerce in commerces {
            match commerce.position() {
                Some(position) => self.commerces.push(Marker {
                    key: MarkerKey {
                        kind: MarkerKind::Commerce,
                        id: commerce.id,
                    },
                    position,
                }),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "commerces without coordinates left off the map");
        }
        self.commerces.len()
    }

    pub fn set_overlays(&mut self, start_points: &[StartPoint], zones: &[DeliveryZone]) {
        self.overlays.clear();
        self.outlines.clear();
        for start in start_points {
            if let Some(position) = start.position() {
                self.overlays.push(Marker {
                    key: MarkerKey {
                        kind: MarkerKind::StartPoint,
                        id: start.id,
                    },
                    position,
                });
            }
        }
        for zone in zones {
            if let Some(position) = zone.position() {
                self.overlays.push(Marker {
                    key: MarkerKey {
                        kind: MarkerKind::Zone,
                        id: zone.id,
                    },
                    position,
                });
            }
            if let Some(ring) = zone.geometry.as_ref().filter(|g| g.len() >= 3) {
                self.outlines.push(ZoneOutline {
                    zone_id: zone.id,
                    ring: ring.clone(),
                });
            }
        }
    }

    /// Hides every marker and polygon except the ones matching `active`.
    pub fn mask_to_active(&mut self, active: ActiveIds) {
        tracing::debug!(
            commerce = ?active.commerce,
            start_point = ?active.start_point,
            zone = ?active.zone,
            "masking markers to active route"
        );
        self.mask = Some(active);
    }

    pub fn unmask(&mut self) {
        self.mask = None;
    }

    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    #[must_use]
    pub fn active(&self) -> Option<ActiveIds> {
        self.mask
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commerces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commerces.is_empty()
    }

    fn opacity(&self, key: MarkerKey) -> f64 {
        match self.mask {
            Some(active) if !active.allows(key) => 0.0,
            _ => 1.0,
        }
    }

    /// Computes the marker layer for `zoom`.
    ///
    /// Masked-out commerces are emitted as transparent singles and take no
    /// part in clustering, so the active commerce is never hidden inside a
    /// cluster.
    pub fn layout(&mut self, zoom: f64) -> Vec<MarkerView> {
        self.cluster_bounds.clear();
        let mut views = Vec::with_capacity(self.commerces.len() + self.overlays.len());

        let mut nodes = Vec::new();
        for (slot, marker) in self.commerces.iter().enumerate() {
            let opacity = self.opacity(marker.key);
            if opacity > 0.0 {
                nodes.push(ProjectedMarker {
                    slot,
                    point: project(marker.position, zoom),
                });
            } else {
                views.push(MarkerView::Single {
                    key: marker.key,
                    position: marker.position,
                    opacity,
                });
            }
        }

        let clustering = zoom < self.config.disable_at_zoom && self.config.radius_px > 0.0;
        if clustering {
            views.extend(self.cluster_nodes(&nodes, zoom));
        } else {
            views.extend(nodes.iter().map(|node| {
                let marker = &self.commerces[node.slot];
                MarkerView::Single {
                    key: marker.key,
                    position: marker.position,
                    opacity: 1.0,
                }
            }));
        }

        for marker in &self.overlays {
            views.push(MarkerView::Single {
                key: marker.key,
                position: marker.position,
                opacity: self.opacity(marker.key),
            });
        }
        views
    }

    fn cluster_nodes(&mut self, nodes: &[ProjectedMarker], zoom: f64) -> Vec<MarkerView> {
        let tree = RTree::bulk_load(nodes.to_vec());
        let radius_2 = self.config.radius_px * self.config.radius_px;
        let mut taken = vec![false; self.commerces.len()];
        let mut views = Vec::new();

        for node in nodes {
            if taken[node.slot] {
                continue;
            }
            let mut members: Vec<&ProjectedMarker> = tree
                .locate_within_distance(node.point, radius_2)
                .filter(|m| !taken[m.slot])
                .collect();
            members.sort_by_key(|m| m.slot);
            for m in &members {
                taken[m.slot] = true;
            }

            let marker = &self.commerces[node.slot];
            if members.len() <= 1 {
                views.push(MarkerView::Single {
                    key: marker.key,
                    position: marker.position,
                    opacity: 1.0,
                });
                continue;
            }

            let Some(bounds) =
                Bounds::from_points(members.iter().map(|m| self.commerces[m.slot].position))
            else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let count = members.len() as f64;
            let sum = members
                .iter()
                .fold([0.0, 0.0], |acc, m| [acc[0] + m.point[0], acc[1] + m.point[1]]);
            let center = unproject([sum[0] / count, sum[1] / count], zoom);

            let index = self.cluster_bounds.len();
            self.cluster_bounds.push(bounds);
            views.push(MarkerView::Cluster {
                index,
                center,
                count: members.len(),
                bounds,
            });
        }
        views
    }

    /// Bounds to zoom to when the cluster `index` of the last layout is
    /// clicked.
    #[must_use]
    pub fn cluster_bounds(&self, index: usize) -> Option<Bounds> {
        self.cluster_bounds.get(index).copied()
    }

    /// Zone outlines with their current opacity.
    #[must_use]
    pub fn polygons(&self) -> Vec<PolygonView> {
        self.outlines
            .iter()
            .map(|outline| PolygonView {
                zone_id: outline.zone_id,
                ring: outline.ring.clone(),
                opacity: self.opacity(MarkerKey {
                    kind: MarkerKind::Zone,
                    id: outline.zone_id,
                }),
            })
            .collect()
    }
}
