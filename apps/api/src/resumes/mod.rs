// Base resume CRUD, scoped to the authenticated owner.

pub mod handlers;
