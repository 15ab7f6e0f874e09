//! Hierarchical index over resources.
//!
//! Resources are grouped by the directory their destination sits in, and
//! nested under the bucket of the directory above it:
//!
//! ```text
//! /index.html              root[""]
//! /blog/a.html             root["blog"]
//! /blog/2012/b.html        root["blog"]["2012"]
//! ```
//!
//! A resource is only reachable through its ancestors: `/blog/2012/b.html`
//! lands in the tree only if something lives directly in `/blog/`. Buckets
//! are sorted by destination, descending, and [`ResourceTree::all`] is the
//! flattened, deduplicated view in the same order.
//!
//! Templates see the tree as nested objects:
//! `{"blog": {"list": [...], "2012": {"list": [...]}}, "all": [...]}`.

use crate::resource::{Resource, dirname};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    pub name: String,
    pub resources: Vec<T>,
    pub children: BTreeMap<String, TreeNode<T>>,
}

impl<T> TreeNode<T> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            resources: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode<T>> {
        self.children.get(name)
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a T>) {
        out.extend(self.resources.iter());
        for child in self.children.values() {
            child.collect(out);
        }
    }

    fn pointers<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a T)>) {
        for (i, resource) in self.resources.iter().enumerate() {
            out.push((format!("{prefix}/list/{i}"), resource));
        }
        for (name, child) in &self.children {
            child.pointers(&format!("{prefix}/{}", escape_pointer(name)), out);
        }
    }

    /// `{"list": [...], "<child>": {...}}`.
    pub fn to_json(&self, render: &impl Fn(&T) -> Value) -> Value {
        let mut map = Map::new();
        for (name, child) in &self.children {
            map.insert(name.clone(), child.to_json(render));
        }
        map.insert(
            "list".to_string(),
            Value::Array(self.resources.iter().map(render).collect()),
        );
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTree<T> {
    root: TreeNode<T>,
    all: Vec<T>,
}

/// Per-resource grouping keys, computed once.
struct Keys {
    belongs_to: String,
    parent: Option<String>,
    depth: usize,
}

impl Keys {
    fn of<T: Resource>(resource: &T) -> Self {
        let destination = resource.destination();
        Self {
            belongs_to: resource.belongs_to(),
            parent: resource.belongs_to_parent(),
            depth: dirname(&destination)
                .split('/')
                .filter(|s| !s.is_empty())
                .count(),
        }
    }
}

impl<T: Resource + Clone + PartialEq> ResourceTree<T> {
    pub fn new(resources: &[T]) -> Self {
        let keys: Vec<Keys> = resources.iter().map(Keys::of).collect();
        let mut root = TreeNode::new("");
        grow(&mut root, None, resources, &keys);

        let mut flat = Vec::new();
        root.collect(&mut flat);
        let mut all: Vec<T> = Vec::with_capacity(flat.len());
        for r in flat {
            if !all.contains(r) {
                all.push(r.clone());
            }
        }
        sort_descending(&mut all);

        Self { root, all }
    }

    /// Every indexed resource, destination descending, without duplicates.
    pub fn all(&self) -> &[T] {
        &self.all
    }

    pub fn root(&self) -> &TreeNode<T> {
        &self.root
    }

    /// Walk bucket names from the root: `get(&["blog", "2012"])`.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode<T>> {
        let mut node = &self.root;
        for name in path {
            node = node.child(name)?;
        }
        Some(node)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// JSON pointer of every slot [`to_json`](Self::to_json) fills, paired
    /// with the resource rendered there. Lets a caller patch one resource's
    /// entries without rebuilding the whole value.
    pub fn pointers(&self) -> Vec<(String, &T)> {
        let mut out = Vec::new();
        for (name, child) in &self.root.children {
            child.pointers(&format!("/{}", escape_pointer(name)), &mut out);
        }
        out.extend(
            self.all
                .iter()
                .enumerate()
                .map(|(i, r)| (format!("/all/{i}"), r)),
        );
        out
    }

    pub fn to_json(&self, render: &impl Fn(&T) -> Value) -> Value {
        let mut map = Map::new();
        for (name, child) in &self.root.children {
            map.insert(name.clone(), child.to_json(render));
        }
        map.insert(
            "all".to_string(),
            Value::Array(self.all.iter().map(render).collect()),
        );
        Value::Object(map)
    }
}

/// RFC 6901 escaping for one pointer segment.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Place every resource whose parent directory name matches `parent`'s
/// directory, then descend once per bucket touched.
///
/// Children must sit exactly one directory below their parent, which keeps
/// repeated directory names (`/x/x/p.html`) from recursing forever.
fn grow<T: Resource + Clone + PartialEq>(
    node: &mut TreeNode<T>,
    parent: Option<&Keys>,
    resources: &[T],
    keys: &[Keys],
) {
    let wanted = parent.map(|p| p.belongs_to.as_str());
    let mut touched: BTreeMap<String, usize> = BTreeMap::new();

    for (i, resource) in resources.iter().enumerate() {
        let k = &keys[i];
        if k.parent.as_deref() != wanted {
            continue;
        }
        if let Some(p) = parent {
            if k.depth != p.depth + 1 {
                continue;
            }
        }
        let bucket = node
            .children
            .entry(k.belongs_to.clone())
            .or_insert_with(|| TreeNode::new(&k.belongs_to));
        if !bucket.resources.contains(resource) {
            bucket.resources.push(resource.clone());
            sort_descending(&mut bucket.resources);
        }
        touched.entry(k.belongs_to.clone()).or_insert(i);
    }

    for (name, representative) in touched {
        if let Some(bucket) = node.children.get_mut(&name) {
            grow(bucket, Some(&keys[representative]), resources, keys);
        }
    }
}

fn sort_descending<T: Resource>(items: &mut [T]) {
    items.sort_by_cached_key(|r| std::cmp::Reverse(r.destination()));
}
