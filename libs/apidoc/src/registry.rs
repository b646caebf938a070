//! Hierarchical route registry.
//!
//! Nodes live in an append-only arena and are addressed by [`NodeId`]. Every
//! node owns the records declared directly on it; [`RouteRegistry::consolidated_paths`]
//! folds a whole subtree into one path map without touching the arena.

use indexmap::IndexMap;

use crate::model::Tag;
use crate::operation::{handler_id, HttpMethod, OperationRecord, OperationSpec};

/// Index of a node inside its [`RouteRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Authentication required by every route under a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthRequirement {
    /// Scheme names; a request passes if any one of them authenticates it.
    pub schemes: Vec<String>,
    /// Let requests without any credentials through.
    pub optional: bool,
}

impl AuthRequirement {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// How a child node relates to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Prefix added to both documented and real paths.
    Nested,
    /// Prefix added to the real path only.
    Undocumented,
    /// Same paths; adds an authentication requirement.
    Authenticated,
}

#[derive(Debug)]
pub struct RegistryNode {
    parent: Option<NodeId>,
    edge: Option<EdgeKind>,
    documented_base: String,
    real_base: String,
    auth: Option<AuthRequirement>,
    paths: IndexMap<String, Vec<OperationRecord>>,
    children: Vec<NodeId>,
    tags: Vec<Tag>,
}

impl RegistryNode {
    fn root(documented_base: String) -> Self {
        Self {
            parent: None,
            edge: None,
            documented_base,
            real_base: String::new(),
            auth: None,
            paths: IndexMap::new(),
            children: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn edge(&self) -> Option<EdgeKind> {
        self.edge
    }

    pub fn documented_base(&self) -> &str {
        &self.documented_base
    }

    pub fn real_base(&self) -> &str {
        &self.real_base
    }

    /// Effective requirement: the innermost authenticated ancestor's, if any.
    pub fn auth(&self) -> Option<&AuthRequirement> {
        self.auth.as_ref()
    }

    /// Records declared directly on this node, by documented path.
    pub fn paths(&self) -> &IndexMap<String, Vec<OperationRecord>> {
        &self.paths
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

#[derive(Debug)]
pub struct RouteRegistry {
    nodes: Vec<RegistryNode>,
    next_sequence: u64,
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::with_documented_base("")
    }

    /// Registry whose documented paths all start with `prefix` while the
    /// router still sees them unprefixed, e.g. behind a proxy mounting the
    /// service at `/api`. `""` and `"/"` mean no prefix.
    pub fn with_documented_base(prefix: &str) -> Self {
        let prefix = prefix.trim().trim_end_matches('/');
        let base = if prefix.is_empty() {
            String::new()
        } else {
            join_path("/", prefix)
        };
        Self {
            nodes: vec![RegistryNode::root(base)],
            next_sequence: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// # Panics
    /// If `id` was not issued by this registry.
    pub fn node(&self, id: NodeId) -> &RegistryNode {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn add_child(
        &mut self,
        parent: NodeId,
        edge: EdgeKind,
        prefix: &str,
        auth: Option<AuthRequirement>,
    ) -> NodeId {
        let p = &self.nodes[parent.0];
        let (documented_base, real_base) = match edge {
            EdgeKind::Nested => (
                join_path(&p.documented_base, prefix),
                join_path(&p.real_base, prefix),
            ),
            EdgeKind::Undocumented => (p.documented_base.clone(), join_path(&p.real_base, prefix)),
            EdgeKind::Authenticated => (p.documented_base.clone(), p.real_base.clone()),
        };
        let auth = auth.or_else(|| p.auth.clone());

        let id = NodeId(self.nodes.len());
        self.nodes.push(RegistryNode {
            parent: Some(parent),
            edge: Some(edge),
            documented_base,
            real_base,
            auth,
            paths: IndexMap::new(),
            children: Vec::new(),
            tags: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Child whose routes live under `prefix` in both the docs and the router.
    pub fn nest(&mut self, parent: NodeId, prefix: &str) -> NodeId {
        self.add_child(parent, EdgeKind::Nested, prefix, None)
    }

    /// Child whose routes are dispatched under `prefix` but documented
    /// without it, e.g. behind a reverse proxy that strips the prefix.
    pub fn nest_undocumented(&mut self, parent: NodeId, prefix: &str) -> NodeId {
        self.add_child(parent, EdgeKind::Undocumented, prefix, None)
    }

    /// Child at the same paths whose routes require `auth`.
    pub fn authenticate(&mut self, parent: NodeId, auth: AuthRequirement) -> NodeId {
        self.add_child(parent, EdgeKind::Authenticated, "", Some(auth))
    }

    /// Turn `spec` into a record on `node`.
    ///
    /// The record's `security` is stamped with the node's effective scheme
    /// names; outside any authenticated group it stays `None`.
    pub fn declare(&mut self, node: NodeId, spec: OperationSpec) -> &OperationRecord {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let n = &mut self.nodes[node.0];
        let documented_path = join_path(&n.documented_base, &spec.path);
        let real_path = join_path(&n.real_base, &spec.path);

        tracing::debug!(
            method = %spec.method,
            path = %documented_path,
            real_path = %real_path,
            sequence,
            "Declared operation"
        );

        let record = OperationRecord {
            method: spec.method,
            handler_id: handler_id(spec.method, &real_path),
            documented_path: documented_path.clone(),
            real_path,
            operation_id: spec.operation_id,
            summary: spec.summary,
            description: spec.description,
            tags: spec.tags,
            parameters: spec.parameters,
            request_body: spec.request_body,
            responses: spec.responses,
            security: n.auth.as_ref().map(|a| a.schemes.clone()),
            sequence,
        };

        let records = n.paths.entry(documented_path).or_default();
        records.push(record);
        &records[records.len() - 1]
    }

    pub fn add_tag(&mut self, node: NodeId, tag: Tag) {
        self.nodes[node.0].tags.push(tag);
    }

    /// Tags visible from `node`: its own, then each ancestor's up to the root.
    pub fn tags_in_scope(&self, node: NodeId) -> Vec<&Tag> {
        let mut tags = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id.0];
            tags.extend(n.tags.iter());
            current = n.parent;
        }
        tags
    }

    /// Every declared tag, in pre-order over the tree.
    pub fn all_tags(&self) -> Vec<&Tag> {
        let mut tags = Vec::new();
        self.walk(self.root(), &mut |n| tags.extend(n.tags.iter()));
        tags
    }

    /// Every record in the subtree rooted at `node`, in pre-order.
    pub fn records(&self, node: NodeId) -> Vec<&OperationRecord> {
        let mut records = Vec::new();
        self.walk(node, &mut |n| records.extend(n.paths.values().flatten()));
        records
    }

    fn walk<'a>(&'a self, node: NodeId, visit: &mut dyn FnMut(&'a RegistryNode)) {
        let n = &self.nodes[node.0];
        visit(n);
        for child in &n.children {
            self.walk(*child, visit);
        }
    }

    /// Path map of the subtree rooted at `node`.
    ///
    /// The node's own paths come first, then each child's in declaration
    /// order. Maps are unioned on documented path; within a path at most one
    /// record per method survives, the earliest declared one.
    pub fn consolidated_paths(&self, node: NodeId) -> IndexMap<String, Vec<&OperationRecord>> {
        let n = &self.nodes[node.0];
        let mut merged: IndexMap<String, Vec<&OperationRecord>> = n
            .paths
            .iter()
            .map(|(path, records)| (path.clone(), records.iter().collect()))
            .collect();

        for child in &n.children {
            for (path, records) in self.consolidated_paths(*child) {
                merged.entry(path).or_default().extend(records);
            }
        }

        for records in merged.values_mut() {
            dedup_first_wins(records);
        }
        merged
    }
}

/// Keep one record per method: the one with the lowest sequence number.
/// Survivors keep their relative order.
pub(crate) fn dedup_first_wins(records: &mut Vec<&OperationRecord>) {
    let mut winners: IndexMap<HttpMethod, u64> = IndexMap::new();
    for record in records.iter() {
        let seq = winners.entry(record.method).or_insert(record.sequence);
        if record.sequence < *seq {
            *seq = record.sequence;
        }
    }

    records.retain(|record| {
        let keep = winners.get(&record.method) == Some(&record.sequence);
        if !keep {
            tracing::debug!(
                method = %record.method,
                path = %record.documented_path,
                sequence = record.sequence,
                "Dropping shadowed duplicate operation"
            );
        }
        keep
    });
}

/// Concatenate path segments without doubling the slash at the seam.
pub(crate) fn join_path(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return base.to_string();
    }
    match (base.ends_with('/'), suffix.starts_with('/')) {
        (true, true) => format!("{}{}", base, &suffix[1..]),
        (false, false) => format!("{base}/{suffix}"),
        _ => format!("{base}{suffix}"),
    }
}
