//! The graph of configuration files linked by `parent_config` and
//! `child_config`.
//!
//! Files given on the command line form a chain, each one a child of the
//! previous. References are followed breadth-first. Once built, the graph is
//! checked for cycles and ambiguity and flattened into merge order, from the
//! top-most parent down to the last child.

use super::document::Document;
use super::normalize;
use super::remote::{is_remote, load_remote, RemoteCache, RemoteFetcher, RemoteTimeouts};
use crate::issue::Issue;
use crate::rule_configuration::as_string_list;
use serde_yaml::Value;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// A file on disk, absolute.
    Local(PathBuf),
    /// A URL.
    Remote(String),
}

/// One document of the graph.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Origin of the document.
    pub reference: Reference,
    /// Directory relative paths in the document are resolved against.
    pub root_directory: PathBuf,
    /// Parsed contents.
    pub document: Document,
}

impl Vertex {
    fn timeouts(&self) -> RemoteTimeouts {
        let seconds = |key: &str| {
            self.document
                .get(key)
                .and_then(Value::as_f64)
                .filter(|s| *s >= 0.0)
                .map(Duration::from_secs_f64)
        };
        let defaults = RemoteTimeouts::default();
        RemoteTimeouts {
            timeout: seconds("remote_timeout").unwrap_or(defaults.timeout),
            timeout_if_cached: seconds("remote_timeout_if_cached")
                .unwrap_or(defaults.timeout_if_cached),
        }
    }

    fn references(&self, key: &str) -> Vec<String> {
        self.document
            .get(key)
            .and_then(|v| as_string_list(key, v).ok())
            .unwrap_or_default()
    }
}

/// Configuration documents and the parent/child edges between them.
#[derive(Debug, Clone)]
pub struct FileGraph {
    root_directory: PathBuf,
    vertices: Vec<Vertex>,
    /// `(parent, child)` vertex indices.
    edges: BTreeSet<(usize, usize)>,
}

impl FileGraph {
    /// Loads `files` and everything they reference.
    ///
    /// Relative `files` are resolved against `root_directory`.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::InitialFileNotFound`] if one of `files` does not
    /// exist, [`Issue::RemoteReferencesLocal`] if a remote document names a
    /// local one, and any error from reading or fetching a document.
    pub fn build(
        root_directory: &Path,
        files: &[PathBuf],
        fetcher: Option<&dyn RemoteFetcher>,
        ignore_parent_and_child_configs: bool,
    ) -> Result<Self, Issue> {
        let mut graph = Self {
            root_directory: root_directory.to_path_buf(),
            vertices: Vec::new(),
            edges: BTreeSet::new(),
        };
        let mut queue = VecDeque::new();

        let mut previous = None;
        for file in files {
            let path = normalize(&root_directory.join(file));
            if !path.is_file() {
                return Err(Issue::InitialFileNotFound { path });
            }
            let document = Document::read(&path)?;
            let directory = path.parent().map_or_else(|| root_directory.to_path_buf(), Path::to_path_buf);
            let (index, added) = graph.add_vertex(Vertex {
                reference: Reference::Local(path),
                root_directory: directory,
                document,
            });
            if let Some(parent) = previous {
                graph.edges.insert((parent, index));
            }
            if added {
                queue.push_back(index);
            }
            previous = Some(index);
        }

        if ignore_parent_and_child_configs {
            return Ok(graph);
        }

        let cache = RemoteCache::new(root_directory);
        while let Some(index) = queue.pop_front() {
            let mut previous = index;
            for reference in graph.vertices[index].references("child_config") {
                if let Some((child, added)) = graph.resolve(index, &reference, fetcher, &cache)? {
                    graph.edges.insert((previous, child));
                    if added {
                        queue.push_back(child);
                    }
                    previous = child;
                }
            }
            if let Some(reference) = graph.vertices[index].references("parent_config").first() {
                if let Some((parent, added)) = graph.resolve(index, reference, fetcher, &cache)? {
                    graph.edges.insert((parent, index));
                    if added {
                        queue.push_back(parent);
                    }
                }
            }
        }

        debug!(
            "Configuration graph has {} files and {} edges",
            graph.vertices.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    fn add_vertex(&mut self, vertex: Vertex) -> (usize, bool) {
        if let Some(existing) = self
            .vertices
            .iter()
            .position(|v| v.reference == vertex.reference)
        {
            return (existing, false);
        }
        self.vertices.push(vertex);
        (self.vertices.len() - 1, true)
    }

    fn resolve(
        &mut self,
        from: usize,
        reference: &str,
        fetcher: Option<&dyn RemoteFetcher>,
        cache: &RemoteCache,
    ) -> Result<Option<(usize, bool)>, Issue> {
        let referencing = &self.vertices[from];

        if is_remote(reference) {
            let key = Reference::Remote(reference.to_string());
            if let Some(existing) = self.vertices.iter().position(|v| v.reference == key) {
                return Ok(Some((existing, false)));
            }
            let text = load_remote(reference, fetcher, cache, referencing.timeouts())?;
            let document = Document::parse(&text)?;
            return Ok(Some(self.add_vertex(Vertex {
                reference: key,
                root_directory: self.root_directory.clone(),
                document,
            })));
        }

        if matches!(referencing.reference, Reference::Remote(_)) {
            return Err(Issue::RemoteReferencesLocal);
        }

        let path = normalize(&referencing.root_directory.join(reference));
        let key = Reference::Local(path.clone());
        if let Some(existing) = self.vertices.iter().position(|v| v.reference == key) {
            return Ok(Some((existing, false)));
        }
        if !path.is_file() {
            warn!(
                "A local configuration at {} was not found. Ignoring this part of the configuration.",
                path.display()
            );
            return Ok(None);
        }
        let document = Document::read(&path)?;
        let directory = path.parent().map_or_else(|| self.root_directory.clone(), Path::to_path_buf);
        Ok(Some(self.add_vertex(Vertex {
            reference: key,
            root_directory: directory,
            document,
        })))
    }

    /// Directory the merged configuration is rooted at.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Local files that are part of the graph.
    #[must_use]
    pub fn local_files(&self) -> BTreeSet<PathBuf> {
        self.vertices
            .iter()
            .filter_map(|v| match &v.reference {
                Reference::Local(path) => Some(path.clone()),
                Reference::Remote(_) => None,
            })
            .collect()
    }

    /// Validates the graph and returns its documents in merge order.
    ///
    /// # Errors
    ///
    /// Returns [`Issue::CyclicConfigurationGraph`] or
    /// [`Issue::AmbiguousConfigurationGraph`].
    pub fn vertices_in_merge_order(&self) -> Result<Vec<&Vertex>, Issue> {
        if self.vertices.is_empty() {
            return Ok(Vec::new());
        }
        self.check_for_cycles()?;
        self.check_for_ambiguity()?;

        let has_parent: HashSet<usize> = self.edges.iter().map(|(_, child)| *child).collect();
        let Some(mut current) = (0..self.vertices.len()).find(|i| !has_parent.contains(i)) else {
            return Err(Issue::CyclicConfigurationGraph);
        };

        let mut ordered = vec![&self.vertices[current]];
        while let Some(child) = self.child_of(current) {
            ordered.push(&self.vertices[child]);
            current = child;
        }
        Ok(ordered)
    }

    fn child_of(&self, parent: usize) -> Option<usize> {
        self.edges
            .iter()
            .find(|(p, _)| *p == parent)
            .map(|(_, child)| *child)
    }

    fn check_for_cycles(&self) -> Result<(), Issue> {
        let mut finished: HashSet<usize> = HashSet::new();
        for start in 0..self.vertices.len() {
            if finished.contains(&start) {
                continue;
            }
            let mut on_path: HashSet<usize> = HashSet::new();
            let mut stack: Vec<(usize, bool)> = vec![(start, false)];
            while let Some((vertex, leaving)) = stack.pop() {
                if leaving {
                    on_path.remove(&vertex);
                    finished.insert(vertex);
                    continue;
                }
                if on_path.contains(&vertex) {
                    return Err(Issue::CyclicConfigurationGraph);
                }
                if finished.contains(&vertex) {
                    continue;
                }
                on_path.insert(vertex);
                stack.push((vertex, true));
                for (_, child) in self.edges.iter().filter(|(p, _)| *p == vertex) {
                    if on_path.contains(child) {
                        return Err(Issue::CyclicConfigurationGraph);
                    }
                    stack.push((*child, false));
                }
            }
        }
        Ok(())
    }

    fn check_for_ambiguity(&self) -> Result<(), Issue> {
        for vertex in 0..self.vertices.len() {
            let parents = self.edges.iter().filter(|(_, c)| *c == vertex).count();
            if parents > 1 {
                return Err(Issue::AmbiguousConfigurationGraph { relation: "parent" });
            }
            let children = self.edges.iter().filter(|(p, _)| *p == vertex).count();
            if children > 1 {
                return Err(Issue::AmbiguousConfigurationGraph { relation: "child" });
            }
        }
        Ok(())
    }
}
