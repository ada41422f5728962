// Job application CRUD, scoped to the authenticated owner.

pub mod handlers;
