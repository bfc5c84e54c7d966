//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Used by the STDIO and TCP transports. Each registry entry becomes one
//! dynamic route whose result is a single text content block.

use futures::FutureExt;
use rmcp::handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter};
use rmcp::model::{CallToolResult, Content};

use super::registry::ToolRegistry;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: &ToolRegistry) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .routes()
        .fold(ToolRouter::new(), |router, (tool, handler)| {
            router.with_route(ToolRoute::new_dyn(tool, move |ctx: ToolCallContext<'_, S>| {
                let args = ctx.arguments.clone().unwrap_or_default();
                let handler = handler.clone();
                async move { Ok(CallToolResult::success(vec![Content::text(handler(args).await)])) }
                    .boxed()
            }))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::domains::tools::gateway::Gateway;
    use crate::garmin::testing::FakeConnect;
    use serde_json::json;
    use std::sync::Arc;

    struct TestServer {}

    fn test_registry() -> ToolRegistry {
        let gateway = Gateway::from_api(FakeConnect::returning(json!({"ok": true})));
        ToolRegistry::new(Arc::new(Config::default()), gateway)
    }

    #[test]
    fn test_build_router() {
        let registry = test_registry();
        let router: ToolRouter<TestServer> = build_tool_router(&registry);
        let tools = router.list_all();

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"list_activities"));
        assert!(names.contains(&"get_sleep_data"));
        assert!(names.contains(&"get_training_plan_workouts"));
    }

    #[test]
    fn test_registry_matches_router() {
        let registry = test_registry();
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(&registry);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
