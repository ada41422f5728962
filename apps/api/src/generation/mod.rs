// Resume generation: model-backed rewrite, template fallback, and the
// orchestration behind the /api/ai routes.
// All inference calls go through model_gateway.

pub mod action_items;
pub mod fallback;
pub mod handlers;
pub mod orchestrator;
