// Module layout (Clean Architecture style)
// - bootstrap: configuration, startup and process supervision
// - infrastructure: DB/session/crypto adapters
// - presentation: request pipeline, route table and HTTP handlers
// - application: ports and request-hardening services
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
