use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of database object an [`ObjectName`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectType {
    Catalog,
    Schema,
    Table,
    View,
    Column,
    Sequence,
    Index,
    PrimaryKey,
    ForeignKey,
    UniqueConstraint,
}

impl ObjectType {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::Catalog => "Catalog",
            ObjectType::Schema => "Schema",
            ObjectType::Table => "Table",
            ObjectType::View => "View",
            ObjectType::Column => "Column",
            ObjectType::Sequence => "Sequence",
            ObjectType::Index => "Index",
            ObjectType::PrimaryKey => "PrimaryKey",
            ObjectType::ForeignKey => "ForeignKey",
            ObjectType::UniqueConstraint => "UniqueConstraint",
        }
    }

    /// Tables and views share a namespace and are both "relations".
    pub fn is_relation(&self) -> bool {
        matches!(self, ObjectType::Table | ObjectType::View)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "catalog" => Ok(ObjectType::Catalog),
            "schema" => Ok(ObjectType::Schema),
            "table" | "relation" => Ok(ObjectType::Table),
            "view" => Ok(ObjectType::View),
            "column" => Ok(ObjectType::Column),
            "sequence" => Ok(ObjectType::Sequence),
            "index" => Ok(ObjectType::Index),
            "primarykey" => Ok(ObjectType::PrimaryKey),
            "foreignkey" => Ok(ObjectType::ForeignKey),
            "uniqueconstraint" => Ok(ObjectType::UniqueConstraint),
            _ => Err(format!("Unknown object type: {}", s)),
        }
    }
}

/// Recursive qualified identifier: a leaf name plus an optional container.
///
/// Any level may be a hole (`None`) meaning "unknown or not applicable on this
/// database". Leading holes are dropped on construction so two names for the
/// same object compare equal regardless of how many empty outer levels the
/// source supplied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<Option<String>>", into = "Vec<Option<String>>")]
pub struct ObjectName {
    pub name: Option<String>,
    pub container: Option<Box<ObjectName>>,
}

impl ObjectName {
    /// Unqualified name.
    pub fn new(name: impl Into<String>) -> Self {
        ObjectName {
            name: Some(name.into()),
            container: None,
        }
    }

    /// Build from outermost to innermost parts, e.g. `[catalog, schema, table]`.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut current: Option<ObjectName> = None;
        for part in parts {
            let part = part.map(Into::into);
            if current.is_none() && part.is_none() {
                continue;
            }
            current = Some(ObjectName {
                name: part,
                container: current.map(Box::new),
            });
        }
        current.unwrap_or_default()
    }

    /// Split a dotted name such as `public.users.id`.
    pub fn parse(dotted: &str) -> Self {
        Self::from_parts(dotted.split('.').map(|p| {
            let p = p.trim();
            if p.is_empty() {
                None
            } else {
                Some(p.to_string())
            }
        }))
    }

    /// Name one level deeper with `self` as the container.
    pub fn child(&self, name: impl Into<String>) -> ObjectName {
        ObjectName {
            name: Some(name.into()),
            container: Some(Box::new(self.clone())),
        }
    }

    /// Like [`child`](Self::child) but keeps a hole when the name is unknown.
    pub fn child_opt(&self, name: Option<&str>) -> ObjectName {
        ObjectName {
            name: name.map(str::to_string),
            container: Some(Box::new(self.clone())),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn container(&self) -> Option<&ObjectName> {
        self.container.as_deref()
    }

    pub fn container_name(&self) -> Option<&str> {
        self.container().and_then(ObjectName::name)
    }

    /// True when no level carries a name.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.container().map_or(true, ObjectName::is_empty)
    }

    /// Number of levels, holes included.
    pub fn depth(&self) -> usize {
        1 + self.container().map_or(0, ObjectName::depth)
    }

    /// All levels from outermost to innermost.
    pub fn parts(&self) -> Vec<Option<String>> {
        let mut parts = Vec::with_capacity(self.depth());
        let mut current = Some(self);
        while let Some(level) = current {
            parts.push(level.name.clone());
            current = level.container();
        }
        parts.reverse();
        parts
    }

    /// Same levels, holes included, with every name passed through `f`.
    pub fn map_names<F: Fn(&str) -> String>(&self, f: &F) -> ObjectName {
        ObjectName {
            name: self.name.as_deref().map(f),
            container: self.container.as_ref().map(|c| Box::new(c.map_names(f))),
        }
    }

    /// Exactly `len` levels ending at the leaf: deeper names lose their outer
    /// levels, shallower names are padded with leading holes.
    pub fn as_list(&self, len: usize) -> Vec<Option<String>> {
        let mut parts = self.parts();
        if parts.len() > len {
            parts.drain(..parts.len() - len);
        } else {
            let mut padded = vec![None; len - parts.len()];
            padded.append(&mut parts);
            parts = padded;
        }
        parts
    }

    /// Keep at most `max_levels` levels counted from the leaf.
    pub fn truncate(&self, max_levels: usize) -> ObjectName {
        if self.depth() <= max_levels {
            return self.clone();
        }
        ObjectName::from_parts(self.as_list(max_levels))
    }

    /// Compare level by level from the leaf outwards, treating a hole on
    /// either side as a wildcard.
    pub fn matches(&self, other: &ObjectName) -> bool {
        let mut left = Some(self);
        let mut right = Some(other);
        while let (Some(l), Some(r)) = (left, right) {
            if let (Some(a), Some(b)) = (&l.name, &r.name) {
                if a != b {
                    return false;
                }
            }
            left = l.container();
            right = r.container();
        }
        true
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named: Vec<String> = self.parts().into_iter().flatten().collect();
        f.write_str(&named.join("."))
    }
}

impl From<&str> for ObjectName {
    fn from(value: &str) -> Self {
        ObjectName::parse(value)
    }
}

impl From<Vec<Option<String>>> for ObjectName {
    fn from(parts: Vec<Option<String>>) -> Self {
        ObjectName::from_parts(parts)
    }
}

impl From<ObjectName> for Vec<Option<String>> {
    fn from(name: ObjectName) -> Self {
        name.parts()
    }
}

/// A typed pointer at one database object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub object_type: ObjectType,
    pub name: ObjectName,
}

impl ObjectReference {
    pub fn new(object_type: ObjectType, name: impl Into<ObjectName>) -> Self {
        ObjectReference {
            object_type,
            name: name.into(),
        }
    }

    pub fn table(name: impl Into<ObjectName>) -> Self {
        Self::new(ObjectType::Table, name)
    }

    pub fn schema(name: impl Into<ObjectName>) -> Self {
        Self::new(ObjectType::Schema, name)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.object_type, self.name)
    }
}
