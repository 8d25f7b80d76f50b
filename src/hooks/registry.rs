use std::sync::Arc;
use tokio::sync::RwLock;
use super::context::{ActionContext, OutcomeContext};
use super::traits::Hook;

/// Registry for managing hooks
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Arc<RwLock<Vec<Arc<dyn Hook>>>>,
    enabled: Arc<RwLock<bool>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            hooks: Arc::new(RwLock::new(Vec::new())),
            enabled: Arc::new(RwLock::new(true)),
        }
    }

    /// Register a new hook
    pub async fn register(&self, hook: Arc<dyn Hook>) {
        let mut hooks = self.hooks.write().await;
        tracing::info!("Registering hook: {}", hook.name());
        hooks.push(hook);
    }

    /// Enable or disable all hooks
    pub async fn set_enabled(&self, enabled: bool) {
        let mut e = self.enabled.write().await;
        *e = enabled;
        tracing::info!("Hooks enabled: {}", enabled);
    }

    pub async fn is_enabled(&self) -> bool {
        *self.enabled.read().await
    }

    pub async fn trigger_action_before(&self, ctx: &ActionContext) {
        if !self.is_enabled().await {
            return;
        }

        let hooks = self.hooks.read().await;
        for hook in hooks.iter() {
            hook.on_action_before(ctx).await;
        }
    }

    /// Fire the outcome-specific callback followed by `on_action_complete`
    pub async fn trigger_outcome(&self, ctx: &ActionContext, outcome: &OutcomeContext) {
        if !self.is_enabled().await {
            return;
        }

        let hooks = self.hooks.read().await;
        for hook in hooks.iter() {
            if outcome.denied {
                hook.on_action_denied(ctx, outcome).await;
            } else if outcome.is_success {
                hook.on_action_success(ctx, outcome).await;
            } else {
                hook.on_action_failed(ctx, outcome).await;
            }
            hook.on_action_complete(ctx, outcome).await;
        }
    }

    /// Get the number of registered hooks
    pub async fn hook_count(&self) -> usize {
        self.hooks.read().await.len()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metering::MeteredAction;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every callback as "<event>:<action>"
    #[derive(Default)]
    pub(crate) struct RecordingHook {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingHook {
        fn push(&self, event: &str, ctx: &ActionContext) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, ctx.action));
        }

        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Hook for RecordingHook {
        async fn on_action_before(&self, ctx: &ActionContext) {
            self.push("before", ctx);
        }

        async fn on_action_success(&self, ctx: &ActionContext, _outcome: &OutcomeContext) {
            self.push("success", ctx);
        }

        async fn on_action_failed(&self, ctx: &ActionContext, _outcome: &OutcomeContext) {
            self.push("failed", ctx);
        }

        async fn on_action_denied(&self, ctx: &ActionContext, _outcome: &OutcomeContext) {
            self.push("denied", ctx);
        }

        async fn on_action_complete(&self, ctx: &ActionContext, _outcome: &OutcomeContext) {
            self.push("complete", ctx);
        }

        fn name(&self) -> &'static str {
            "RecordingHook"
        }
    }

    fn ctx() -> ActionContext {
        ActionContext::new("session-1", Some("alice"), MeteredAction::VideoPlay, 1, 5)
    }

    #[tokio::test]
    async fn test_outcome_dispatch() {
        let registry = HookRegistry::new();
        let hook = Arc::new(RecordingHook::default());
        registry.register(hook.clone()).await;
        assert_eq!(registry.hook_count().await, 1);

        registry.trigger_action_before(&ctx()).await;
        registry.trigger_outcome(&ctx(), &OutcomeContext::success(4)).await;
        registry
            .trigger_outcome(&ctx(), &OutcomeContext::failure(5, "boom".into()))
            .await;
        registry
            .trigger_outcome(&ctx(), &OutcomeContext::denied(0, "short".into()))
            .await;

        assert_eq!(
            hook.events(),
            vec![
                "before:video_play",
                "success:video_play",
                "complete:video_play",
                "failed:video_play",
                "complete:video_play",
                "denied:video_play",
                "complete:video_play",
            ]
        );
    }

    #[tokio::test]
    async fn test_disabled_registry_is_silent() {
        let registry = HookRegistry::new();
        let hook = Arc::new(RecordingHook::default());
        registry.register(hook.clone()).await;
        registry.set_enabled(false).await;

        registry.trigger_action_before(&ctx()).await;
        registry.trigger_outcome(&ctx(), &OutcomeContext::success(4)).await;
        assert!(hook.events().is_empty());
    }
}
