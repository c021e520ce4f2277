//! Identity types for graphs.
//!
//! Node ids are newtypes over `u32`. They are allocated monotonically by the
//! editor, so their ordering doubles as declaration order for code
//! generation.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Identifier of a node instance inside one graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The id following this one.
    #[inline]
    pub fn next(self) -> NodeId {
        NodeId(self.0.saturating_add(1))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a scene; one graph per scene.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The scene id encoded as characters valid in a script identifier.
    ///
    /// ASCII letters and digits are kept, `_` becomes `__` and any other
    /// character becomes `_<hex code point>_`. The encoding is reversible,
    /// so distinct scenes never share generated function names.
    pub fn ident(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            match c {
                c if c.is_ascii_alphanumeric() => out.push(c),
                '_' => out.push_str("__"),
                c => {
                    let _ = write!(out, "_{:x}_", u32::from(c));
                }
            }
        }
        out
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId(42);
        assert_eq!(id.next(), NodeId(43));
        assert_eq!(format!("{:?}", id), "NodeId(42)");
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_scene_ident_escapes() {
        assert_eq!(SceneId::new("level-1 intro").ident(), "level_2d_1_20_intro");
        assert_eq!(SceneId::new("main").ident(), "main");
        assert_eq!(SceneId::new("level_1").ident(), "level__1");
        assert_eq!(SceneId::new("").ident(), "");
    }

    #[test]
    fn test_scene_ident_is_injective() {
        let scenes = ["level 1", "level_1", "level_20_1", "level__1", "", "_", "__", "é"];
        let idents: std::collections::HashSet<_> =
            scenes.iter().map(|s| SceneId::new(*s).ident()).collect();
        assert_eq!(idents.len(), scenes.len());
    }

    #[test]
    fn test_node_id_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(NodeId(3), "three");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"3":"three"}"#);
        let back: std::collections::BTreeMap<NodeId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[&NodeId(3)], "three");
    }
}
