//! Directed graph edge type.

/// Road classification carried on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoadType {
    /// Grade-separated highway.
    Motorway,
    /// Major through road.
    Primary,
    /// Connecting road.
    Secondary,
    /// Local access road.
    #[default]
    Residential,
    /// Parking aisles, driveways and the like.
    Service,
}

impl RoadType {
    /// Decode from the on-disk representation, defaulting unknown values
    /// to `Residential`.
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RoadType::Motorway,
            1 => RoadType::Primary,
            2 => RoadType::Secondary,
            4 => RoadType::Service,
            _ => RoadType::Residential,
        }
    }

    /// On-disk representation.
    pub fn as_u8(&self) -> u8 {
        match self {
            RoadType::Motorway => 0,
            RoadType::Primary => 1,
            RoadType::Secondary => 2,
            RoadType::Residential => 3,
            RoadType::Service => 4,
        }
    }
}

/// A directed, weighted edge of the road-network graph.
///
/// Endpoints are node ids and may reference nodes outside the tile the
/// edge was decoded from. Bidirectional roads appear as two edges with
/// swapped endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEdge {
    /// Source node id.
    pub from_node: u64,
    /// Destination node id.
    pub to_node: u64,
    /// Great-circle length between the endpoints, in meters.
    pub length_m: f64,
    /// Road classification.
    pub road_type: RoadType,
    /// Posted speed limit in km/h (0 when unknown).
    pub speed_limit_kmh: u16,
    /// Opaque attribute flags.
    pub flags: u32,
}

impl MapEdge {
    /// Create a new edge.
    pub fn new(
        from_node: u64,
        to_node: u64,
        length_m: f64,
        road_type: RoadType,
        speed_limit_kmh: u16,
        flags: u32,
    ) -> Self {
        Self {
            from_node,
            to_node,
            length_m,
            road_type,
            speed_limit_kmh,
            flags,
        }
    }

    /// The same edge traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            from_node: self.to_node,
            to_node: self.from_node,
            ..*self
        }
    }

    /// Whether the edge touches the given node.
    pub fn is_incident_to(&self, node_id: u64) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_type_roundtrip() {
        for t in [
            RoadType::Motorway,
            RoadType::Primary,
            RoadType::Secondary,
            RoadType::Residential,
            RoadType::Service,
        ] {
            assert_eq!(RoadType::from_u8(t.as_u8()), t);
        }
    }

    #[test]
    fn test_road_type_unknown_defaults_to_residential() {
        assert_eq!(RoadType::from_u8(99), RoadType::Residential);
    }

    #[test]
    fn test_reversed_swaps_endpoints_only() {
        let e = MapEdge::new(1001, 1002, 55.0, RoadType::Primary, 50, 7);
        let r = e.reversed();
        assert_eq!(r.from_node, 1002);
        assert_eq!(r.to_node, 1001);
        assert_eq!(r.length_m, e.length_m);
        assert_eq!(r.road_type, e.road_type);
        assert_eq!(r.speed_limit_kmh, e.speed_limit_kmh);
        assert_eq!(r.flags, e.flags);
    }

    #[test]
    fn test_is_incident_to() {
        let e = MapEdge::new(1001, 1002, 55.0, RoadType::Residential, 30, 0);
        assert!(e.is_incident_to(1001));
        assert!(e.is_incident_to(1002));
        assert!(!e.is_incident_to(1003));
    }
}
