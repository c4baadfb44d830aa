//! Typed view over Ghost's lexical document tree
//!
//! A lexical document is a JSON tree of nodes. Only image nodes and the
//! `children` arrays matter for alt text, so nodes are modelled as a tagged
//! union of image node, container node and opaque value. Every field that is
//! not modelled is kept in `extra` and written back unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

const IMAGE_TYPE: &str = "image";

/// Alt field state of an image node.
///
/// Old content has no `alt` key at all; newer content may carry `null` or an
/// empty string. All three count as missing, but are written back as found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AltText {
    #[default]
    Absent,
    Null,
    Text(String),
}

impl AltText {
    pub fn is_missing(&self) -> bool {
        match self {
            AltText::Text(text) => text.is_empty(),
            AltText::Absent | AltText::Null => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AltText::Text(text) => Some(text),
            AltText::Absent | AltText::Null => None,
        }
    }

    fn from_field(value: Option<Value>) -> Self {
        match value {
            None => AltText::Absent,
            Some(Value::String(text)) => AltText::Text(text),
            // Non-string alts are malformed; treat them as missing
            Some(_) => AltText::Null,
        }
    }
}

/// An image node (`"type": "image"`)
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub src: Option<String>,
    pub alt: AltText,
    pub children: Option<Vec<LexicalNode>>,
    extra: Map<String, Value>,
}

impl ImageNode {
    pub fn new(src: impl Into<String>, alt: AltText) -> Self {
        Self {
            src: Some(src.into()),
            alt,
            children: None,
            extra: Map::new(),
        }
    }
}

/// Any non-image node
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    pub node_type: Option<String>,
    pub children: Option<Vec<LexicalNode>>,
    extra: Map<String, Value>,
}

impl ContainerNode {
    pub fn new(node_type: impl Into<String>, children: Vec<LexicalNode>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            children: Some(children),
            extra: Map::new(),
        }
    }
}

/// A node in a lexical tree
#[derive(Debug, Clone, PartialEq)]
pub enum LexicalNode {
    Image(ImageNode),
    Container(ContainerNode),
    /// A non-object entry inside a `children` array
    Opaque(Value),
}

impl LexicalNode {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return LexicalNode::Opaque(value);
        };

        let children = match map.remove("children") {
            Some(Value::Array(items)) => {
                Some(items.into_iter().map(LexicalNode::from_value).collect())
            }
            Some(other) => {
                map.insert("children".to_string(), other);
                None
            }
            None => None,
        };

        let is_image = map.get("type").and_then(Value::as_str) == Some(IMAGE_TYPE);
        if is_image {
            map.remove("type");
            let src = match map.remove("src") {
                Some(Value::String(src)) => Some(src),
                Some(other) => {
                    map.insert("src".to_string(), other);
                    None
                }
                None => None,
            };
            let alt = AltText::from_field(map.remove("alt"));
            return LexicalNode::Image(ImageNode {
                src,
                alt,
                children,
                extra: map,
            });
        }

        let node_type = match map.remove("type") {
            Some(Value::String(node_type)) => Some(node_type),
            Some(other) => {
                map.insert("type".to_string(), other);
                None
            }
            None => None,
        };

        LexicalNode::Container(ContainerNode {
            node_type,
            children,
            extra: map,
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            LexicalNode::Opaque(value) => value.clone(),
            LexicalNode::Image(image) => {
                let mut map = image.extra.clone();
                map.insert("type".to_string(), Value::String(IMAGE_TYPE.to_string()));
                if let Some(src) = &image.src {
                    map.insert("src".to_string(), Value::String(src.clone()));
                }
                match &image.alt {
                    AltText::Absent => {}
                    AltText::Null => {
                        map.insert("alt".to_string(), Value::Null);
                    }
                    AltText::Text(text) => {
                        map.insert("alt".to_string(), Value::String(text.clone()));
                    }
                }
                insert_children(&mut map, image.children.as_deref());
                Value::Object(map)
            }
            LexicalNode::Container(container) => {
                let mut map = container.extra.clone();
                if let Some(node_type) = &container.node_type {
                    map.insert("type".to_string(), Value::String(node_type.clone()));
                }
                insert_children(&mut map, container.children.as_deref());
                Value::Object(map)
            }
        }
    }

    pub fn children(&self) -> Option<&[LexicalNode]> {
        match self {
            LexicalNode::Image(image) => image.children.as_deref(),
            LexicalNode::Container(container) => container.children.as_deref(),
            LexicalNode::Opaque(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<LexicalNode>> {
        match self {
            LexicalNode::Image(image) => image.children.as_mut(),
            LexicalNode::Container(container) => container.children.as_mut(),
            LexicalNode::Opaque(_) => None,
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map(|children| children.iter().map(LexicalNode::node_count).sum())
            .unwrap_or(0)
    }

    /// Image nodes in depth-first pre-order
    pub fn images(&self) -> Vec<&ImageNode> {
        let mut found = vec![];
        collect_images(self, &mut found);
        found
    }
}

fn insert_children(map: &mut Map<String, Value>, children: Option<&[LexicalNode]>) {
    if let Some(children) = children {
        map.insert(
            "children".to_string(),
            Value::Array(children.iter().map(LexicalNode::to_value).collect()),
        );
    }
}

fn collect_images<'a>(node: &'a LexicalNode, found: &mut Vec<&'a ImageNode>) {
    if let LexicalNode::Image(image) = node {
        found.push(image);
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_images(child, found);
        }
    }
}

impl Serialize for LexicalNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LexicalNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(LexicalNode::from_value)
    }
}

/// A full lexical document (`{"root": {...}}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalDocument {
    pub root: LexicalNode,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl LexicalDocument {
    pub fn new(root: LexicalNode) -> Self {
        Self {
            root,
            extra: Map::new(),
        }
    }

    /// Parse the JSON string Ghost stores in a post's `lexical` field
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize back into the string form Ghost expects
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn images(&self) -> Vec<&ImageNode> {
        self.root.images()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}
