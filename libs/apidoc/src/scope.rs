//! Declaration API that feeds both the registry and a router.
//!
//! A [`RouteScope`] pairs a registry node with a [`RouteSink`]: every
//! operation declared through it becomes a record in the document and a
//! mounted handler in the router, from the same call.

use crate::document::OpenApiDoc;
use crate::model::Tag;
use crate::operation::{HttpMethod, OperationBuilder};
use crate::registry::{AuthRequirement, NodeId};

/// What the router needs to dispatch one declared operation.
#[derive(Clone, Debug, PartialEq)]
pub struct MountedRoute {
    pub method: HttpMethod,
    pub real_path: String,
    pub auth: Option<AuthRequirement>,
    pub handler_id: String,
}

/// The router collaborator. The core never inspects or invokes handlers.
pub trait RouteSink {
    type Handler;

    fn mount(&mut self, route: MountedRoute, handler: Self::Handler);
}

pub struct RouteScope<'a, K: RouteSink> {
    doc: &'a mut OpenApiDoc,
    sink: &'a mut K,
    node: NodeId,
}

impl<'a, K: RouteSink> RouteScope<'a, K> {
    pub(crate) fn new(doc: &'a mut OpenApiDoc, sink: &'a mut K, node: NodeId) -> Self {
        Self { doc, sink, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn doc(&self) -> &OpenApiDoc {
        self.doc
    }

    fn child(&mut self, node: NodeId, body: impl FnOnce(&mut RouteScope<'_, K>)) -> &mut Self {
        let mut scope = RouteScope {
            doc: &mut *self.doc,
            sink: &mut *self.sink,
            node,
        };
        body(&mut scope);
        self
    }

    /// Declare routes under `prefix`.
    pub fn route(&mut self, prefix: &str, body: impl FnOnce(&mut RouteScope<'_, K>)) -> &mut Self {
        let node = self.doc.nest(self.node, prefix);
        self.child(node, body)
    }

    /// Declare routes dispatched under `prefix` but documented without it.
    pub fn undocumented_route(
        &mut self,
        prefix: &str,
        body: impl FnOnce(&mut RouteScope<'_, K>),
    ) -> &mut Self {
        let node = self.doc.nest_undocumented(self.node, prefix);
        self.child(node, body)
    }

    /// Declare routes that require one of `auth`'s schemes.
    pub fn authenticate(
        &mut self,
        auth: AuthRequirement,
        body: impl FnOnce(&mut RouteScope<'_, K>),
    ) -> &mut Self {
        let node = self.doc.authenticate(self.node, auth);
        self.child(node, body)
    }

    /// Declare a tag in this scope.
    pub fn tag(&mut self, tag: Tag) -> &mut Self {
        self.doc.add_tag(self.node, tag);
        self
    }

    pub fn operation(
        &mut self,
        method: HttpMethod,
        path: &str,
        handler: K::Handler,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> &mut Self {
        let builder = configure(OperationBuilder::new(method, path));
        let (method, real_path, handler_id) = {
            let record = self.doc.declare(self.node, builder);
            (record.method, record.real_path.clone(), record.handler_id.clone())
        };
        let auth = self.doc.registry().node(self.node).auth().cloned();

        self.sink.mount(
            MountedRoute {
                method,
                real_path,
                auth,
                handler_id,
            },
            handler,
        );
        self
    }

    pub fn get(
        &mut self,
        path: &str,
        handler: K::Handler,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> &mut Self {
        self.operation(HttpMethod::Get, path, handler, configure)
    }

    pub fn post(
        &mut self,
        path: &str,
        handler: K::Handler,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> &mut Self {
        self.operation(HttpMethod::Post, path, handler, configure)
    }

    pub fn put(
        &mut self,
        path: &str,
        handler: K::Handler,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> &mut Self {
        self.operation(HttpMethod::Put, path, handler, configure)
    }

    pub fn delete(
        &mut self,
        path: &str,
        handler: K::Handler,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> &mut Self {
        self.operation(HttpMethod::Delete, path, handler, configure)
    }

    pub fn patch(
        &mut self,
        path: &str,
        handler: K::Handler,
        configure: impl FnOnce(OperationBuilder) -> OperationBuilder,
    ) -> &mut Self {
        self.operation(HttpMethod::Patch, path, handler, configure)
    }
}
