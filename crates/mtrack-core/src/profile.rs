//! The persisted per-program profile record.
//!
//! A profile is a nested tree whose shape changed across two dozen releases.
//! Every node is tagged with its kind when it is decoded, so code that walks
//! the tree matches on [`Node`] instead of inspecting values to guess shapes.

use crate::error::{ProfileError, Result};
use crate::grid::{Grid, SparseGrid};
use crate::resolution::Resolution;
use crate::version::SchemaVersion;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Top-level field holding the schema version tag.
pub const VERSION_FIELD: &str = "Version";

/// Children of a [`Node::Group`]. Ordered so traversals are deterministic.
pub type Group = BTreeMap<Key, Node>;

/// A key inside a group: either a field name or a display resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Name(String),
    Resolution(Resolution),
}

impl Key {
    pub fn name(name: impl Into<String>) -> Self {
        Key::Name(name.into())
    }

    pub fn as_resolution(&self) -> Option<Resolution> {
        match self {
            Key::Resolution(res) => Some(*res),
            Key::Name(_) => None,
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<Resolution> for Key {
    fn from(res: Resolution) -> Self {
        Key::Resolution(res)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Resolution(res) => res.fmt(f),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.parse::<Resolution>() {
            Ok(res) => Key::Resolution(res),
            Err(_) => Key::Name(raw),
        })
    }
}

/// One node of the profile tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Node {
    Group(Group),
    Grid(Grid),
    /// Legacy sparse coordinate map, only present in pre-2.0.10 records.
    Sparse(SparseGrid),
    /// Placeholder left where a grid was split out for separate storage.
    GridRef(usize),
    List(Vec<Node>),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Node {
    pub fn empty_group() -> Self {
        Node::Group(Group::new())
    }

    /// Builds a group from `(name, node)` pairs.
    pub fn group_of<const N: usize>(fields: [(&str, Node); N]) -> Self {
        Node::Group(
            fields
                .into_iter()
                .map(|(name, node)| (Key::name(name), node))
                .collect(),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Grid(_) => "grid",
            Node::Sparse(_) => "sparse",
            Node::GridRef(_) => "grid_ref",
            Node::List(_) => "list",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::Text(_) => "text",
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Node::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Numeric value as a float; ints widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Int(n) => Some(*n as f64),
            Node::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric value as an integer; floats truncate toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(n) => Some(*n),
            Node::Float(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl From<Grid> for Node {
    fn from(grid: Grid) -> Self {
        Node::Grid(grid)
    }
}

impl From<SparseGrid> for Node {
    fn from(sparse: SparseGrid) -> Self {
        Node::Sparse(sparse)
    }
}

fn lookup<'a>(group: &'a Group, path: &[&str]) -> Result<&'a Node> {
    let mut current = group;
    for (depth, name) in path.iter().enumerate() {
        let node = current
            .get(&Key::name(*name))
            .ok_or_else(|| ProfileError::missing(&path[..=depth]))?;
        if depth + 1 == path.len() {
            return Ok(node);
        }
        current = node
            .as_group()
            .ok_or_else(|| ProfileError::mismatch(&path[..=depth], "group"))?;
    }
    Err(ProfileError::internal("empty field path"))
}

fn lookup_mut<'a>(group: &'a mut Group, path: &[&str]) -> Result<&'a mut Node> {
    let (last, parents) = path
        .split_last()
        .ok_or_else(|| ProfileError::internal("empty field path"))?;
    let parent = parent_mut(group, parents)?;
    parent
        .get_mut(&Key::name(*last))
        .ok_or_else(|| ProfileError::missing(path))
}

fn parent_mut<'a>(group: &'a mut Group, path: &[&str]) -> Result<&'a mut Group> {
    let mut current = group;
    for (depth, name) in path.iter().enumerate() {
        current = current
            .get_mut(&Key::name(*name))
            .ok_or_else(|| ProfileError::missing(&path[..=depth]))?
            .as_group_mut()
            .ok_or_else(|| ProfileError::mismatch(&path[..=depth], "group"))?;
    }
    Ok(current)
}

/// Root of one program's statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileRecord {
    root: Group,
}

impl ProfileRecord {
    /// An empty skeleton, as created on first sight of a program.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_group(root: Group) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// The stored version tag, if any.
    pub fn version_tag(&self) -> Option<&str> {
        match self.root.get(&Key::name(VERSION_FIELD)) {
            Some(Node::Text(tag)) => Some(tag.as_str()),
            _ => None,
        }
    }

    /// The stored version, resolving unknown or absent tags to the oldest.
    pub fn version(&self) -> SchemaVersion {
        self.version_tag()
            .map(SchemaVersion::resolve)
            .unwrap_or(SchemaVersion::OLDEST)
    }

    pub fn set_version(&mut self, version: SchemaVersion) {
        self.root.insert(
            Key::name(VERSION_FIELD),
            Node::Text(version.as_str().to_string()),
        );
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        lookup(&self.root, path).is_ok()
    }

    pub fn get(&self, path: &[&str]) -> Result<&Node> {
        lookup(&self.root, path)
    }

    pub fn get_mut(&mut self, path: &[&str]) -> Result<&mut Node> {
        lookup_mut(&mut self.root, path)
    }

    pub fn group(&self, path: &[&str]) -> Result<&Group> {
        lookup(&self.root, path)?
            .as_group()
            .ok_or_else(|| ProfileError::mismatch(path, "group"))
    }

    /// The group at `path`; an empty path yields the root.
    pub fn group_mut(&mut self, path: &[&str]) -> Result<&mut Group> {
        parent_mut(&mut self.root, path)
    }

    pub fn int(&self, path: &[&str]) -> Result<i64> {
        self.get(path)?
            .as_i64()
            .ok_or_else(|| ProfileError::mismatch(path, "number"))
    }

    pub fn float(&self, path: &[&str]) -> Result<f64> {
        self.get(path)?
            .as_f64()
            .ok_or_else(|| ProfileError::mismatch(path, "number"))
    }

    pub fn list_mut(&mut self, path: &[&str]) -> Result<&mut Vec<Node>> {
        match self.get_mut(path)? {
            Node::List(items) => Ok(items),
            _ => Err(ProfileError::mismatch(path, "list")),
        }
    }

    /// Sets the field at `path`, replacing any previous value.
    ///
    /// Every parent group must already exist.
    pub fn insert(&mut self, path: &[&str], node: Node) -> Result<Option<Node>> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| ProfileError::internal("empty field path"))?;
        Ok(parent_mut(&mut self.root, parents)?.insert(Key::name(*last), node))
    }

    /// Removes and returns the field at `path`. Absence is corruption.
    pub fn take(&mut self, path: &[&str]) -> Result<Node> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| ProfileError::internal("empty field path"))?;
        parent_mut(&mut self.root, parents)?
            .remove(&Key::name(*last))
            .ok_or_else(|| ProfileError::missing(path))
    }

    /// Removes the field at `path` if present. The parent must exist.
    pub fn remove(&mut self, path: &[&str]) -> Result<Option<Node>> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| ProfileError::internal("empty field path"))?;
        Ok(parent_mut(&mut self.root, parents)?.remove(&Key::name(*last)))
    }

    /// Removes and returns the group at `path`.
    pub fn take_group(&mut self, path: &[&str]) -> Result<Group> {
        match self.take(path)? {
            Node::Group(group) => Ok(group),
            _ => Err(ProfileError::mismatch(path, "group")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProfileRecord {
        let mut record = ProfileRecord::new();
        record
            .insert(
                &["Ticks"],
                Node::group_of([("Tracks", Node::Int(10)), ("Total", Node::Float(2.5))]),
            )
            .unwrap();
        record
    }

    #[test]
    fn test_missing_version_is_oldest() {
        let record = ProfileRecord::new();
        assert_eq!(record.version(), SchemaVersion::OLDEST);
        assert_eq!(record.version_tag(), None);
    }

    #[test]
    fn test_path_lookup() {
        let record = sample();
        assert_eq!(record.int(&["Ticks", "Tracks"]).unwrap(), 10);
        assert_eq!(record.float(&["Ticks", "Total"]).unwrap(), 2.5);
        assert!(record.contains(&["Ticks"]));
    }

    #[test]
    fn test_missing_field_reports_deepest_known_path() {
        let record = sample();
        let err = record.get(&["Ticks", "Session", "Tracks"]).unwrap_err();
        assert_eq!(
            err,
            ProfileError::MissingField {
                path: "Ticks.Session".to_string()
            }
        );
    }

    #[test]
    fn test_descending_through_leaf_is_type_mismatch() {
        let record = sample();
        let err = record.get(&["Ticks", "Tracks", "Deeper"]).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_take_removes_and_requires_presence() {
        let mut record = sample();
        assert_eq!(record.take(&["Ticks", "Tracks"]).unwrap(), Node::Int(10));
        assert!(record.take(&["Ticks", "Tracks"]).unwrap_err().is_missing_field());
    }

    #[test]
    fn test_remove_tolerates_absent_leaf() {
        let mut record = sample();
        assert_eq!(record.remove(&["Ticks", "Session"]).unwrap(), None);
        assert_eq!(
            record.remove(&["Ticks", "Total"]).unwrap(),
            Some(Node::Float(2.5))
        );
        assert!(record.remove(&["Keys", "All"]).unwrap_err().is_missing_field());
    }

    #[test]
    fn test_insert_requires_parent() {
        let mut record = sample();
        assert!(record.insert(&["Keys", "All"], Node::empty_group()).is_err());
    }

    #[test]
    fn test_json_shape_is_tagged() {
        let mut record = ProfileRecord::new();
        record.set_version(SchemaVersion::current());
        let mut tracks = Group::new();
        tracks.insert(
            Key::Resolution(Resolution::new(2, 1)),
            Node::Grid(Grid::zeros(Resolution::new(2, 1))),
        );
        record.insert(&["Tracks"], Node::Group(tracks)).unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Version"]["kind"], "text");
        assert_eq!(json["Tracks"]["value"]["2x1"]["kind"], "grid");

        let back: ProfileRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
