use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use foundation::math::Position;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arbitrary feature properties, as carried by GeoJSON.
pub type Properties = Map<String, Value>;

/// Property flagging a feature as a cluster.
pub const CLUSTER_KEY: &str = "cluster";
pub const CLUSTER_ID_KEY: &str = "cluster_id";
pub const POINT_COUNT_KEY: &str = "point_count";

/// Derived properties stamped on every spider member.
pub const STICK_ID_KEY: &str = "_stickId";
pub const PARENT_ID_KEY: &str = "_parentId";
pub const MEMBER_CLUSTER_KEY: &str = "_cluster";

/// Feature identifier: GeoJSON allows any number or a string.
///
/// Non-negative integers are `Number`, negative ones `Signed`, anything with a
/// fraction `Float`. Floats compare and hash by bit pattern so ids can key maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl FeatureId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_u64()
                .map(Self::Number)
                .or_else(|| n.as_i64().map(Self::Signed))
                .or_else(|| n.as_f64().map(Self::Float)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Signed(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Signed(_) => 1,
            Self::Float(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

impl PartialEq for FeatureId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FeatureId {}

impl PartialOrd for FeatureId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FeatureId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Signed(a), Self::Signed(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for FeatureId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Number(n) => n.hash(state),
            Self::Signed(n) => n.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

impl From<u64> for FeatureId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Signed(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u64);

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
}

impl Geometry {
    pub fn point(position: Position) -> Self {
        Self::Point(position.as_array())
    }

    pub fn line(positions: &[Position]) -> Self {
        Self::LineString(positions.iter().map(|p| p.as_array()).collect())
    }

    /// The point itself, or the first vertex of a line.
    pub fn anchor(&self) -> Option<Position> {
        match self {
            Self::Point(c) => Some(Position::from(*c)),
            Self::LineString(cs) => cs.first().map(|c| Position::from(*c)),
        }
    }
}

/// A GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: Option<FeatureId>, geometry: Geometry, properties: Properties) -> Self {
        Self {
            id,
            geometry,
            properties,
        }
    }

    pub fn point(id: impl Into<FeatureId>, position: Position) -> Self {
        Self::new(Some(id.into()), Geometry::point(position), Properties::new())
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn position(&self) -> Option<Position> {
        self.geometry.anchor()
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// A host-computed aggregation of nearby points, rendered as one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    pub position: Position,
    pub point_count: usize,
    /// The feature the host rendered for this cluster.
    pub feature: Feature,
}

impl Cluster {
    pub fn new(id: ClusterId, position: Position, point_count: usize) -> Self {
        let feature = Feature::new(None, Geometry::point(position), Properties::new())
            .with_property(CLUSTER_KEY, true)
            .with_property(CLUSTER_ID_KEY, id.0)
            .with_property(POINT_COUNT_KEY, point_count as u64);
        Self {
            id,
            position,
            point_count,
            feature,
        }
    }

    /// Recognises a cluster feature from its `cluster`/`cluster_id` properties.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let props = &feature.properties;
        if props.get(CLUSTER_KEY).and_then(Value::as_bool) != Some(true) {
            return None;
        }
        let id = props.get(CLUSTER_ID_KEY).and_then(Value::as_u64)?;
        let Geometry::Point(coords) = &feature.geometry else {
            return None;
        };
        let point_count = props
            .get(POINT_COUNT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;

        Some(Self {
            id: ClusterId(id),
            position: Position::from(*coords),
            point_count,
            feature: feature.clone(),
        })
    }
}

/// One cluster leaf, placed in the open layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderMember {
    /// Decimal layout index; unique within one open layout only.
    pub stick_id: String,
    pub parent_id: Option<FeatureId>,
    pub cluster_id: ClusterId,
    pub position: Position,
    /// The leaf's properties plus the derived keys.
    pub properties: Properties,
}

impl SpiderMember {
    pub fn from_leaf(
        index: usize,
        leaf: &Feature,
        cluster_id: ClusterId,
        position: Position,
    ) -> Self {
        let stick_id = index.to_string();
        let mut properties = leaf.properties.clone();
        properties.insert(STICK_ID_KEY.to_string(), Value::from(stick_id.as_str()));
        if let Some(id) = &leaf.id {
            properties.insert(PARENT_ID_KEY.to_string(), id.to_value());
        }
        properties.insert(MEMBER_CLUSTER_KEY.to_string(), Value::from(cluster_id.0));

        Self {
            stick_id,
            parent_id: leaf.id.clone(),
            cluster_id,
            position,
            properties,
        }
    }

    pub fn to_feature(&self) -> Feature {
        Feature::new(None, Geometry::point(self.position), self.properties.clone())
    }
}

/// Line from the cluster center to one member, keyed by the member's stick id.
#[derive(Debug, Clone, PartialEq)]
pub struct Stick {
    pub id: String,
    pub from: Position,
    pub to: Position,
}

impl Stick {
    pub fn to_feature(&self) -> Feature {
        Feature::new(
            Some(FeatureId::Text(self.id.clone())),
            Geometry::line(&[self.from, self.to]),
            Properties::new(),
        )
    }
}

/// What a clicked feature is, from the manager's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Cluster(Cluster),
    SpiderMember { parent_id: FeatureId },
    Plain,
}

pub fn classify(feature: &Feature) -> HitTarget {
    if let Some(cluster) = Cluster::from_feature(feature) {
        return HitTarget::Cluster(cluster);
    }
    match feature.properties.get(PARENT_ID_KEY).and_then(FeatureId::from_value) {
        Some(parent_id) => HitTarget::SpiderMember { parent_id },
        None => HitTarget::Plain,
    }
}
